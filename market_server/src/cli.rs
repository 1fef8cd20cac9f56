use std::env;

const HELP_TEXT: &str = include_str!("./cli-help.txt");

/// Variables shown by `--help`. Anything holding a secret stays off this list.
const VISIBLE_ENVS: [&str; 9] = [
    "RUST_LOG",
    "MKT_HOST",
    "MKT_PORT",
    "MKT_DATABASE_URL",
    "MKT_DB_MAX_CONNECTIONS",
    "MKT_RUN_MIGRATIONS",
    "MKT_GATEWAY_TIMEOUT",
    "MKT_STRIPE_API_URL",
    "MKT_STRIPE_WEBHOOK_TOLERANCE",
];

/// The server takes no arguments. Passing any prints the help text and the current configuration instead.
/// Returns `true` when the caller should exit without starting the server.
pub fn handle_command_line_args() -> bool {
    if env::args().len() <= 1 {
        return false;
    }
    println!("\n{HELP_TEXT}\n");
    print_visible_envs();
    true
}

fn print_visible_envs() {
    println!("Current configuration (secrets are not shown):");
    for name in VISIBLE_ENVS {
        let value = match env::var_os(name) {
            Some(v) => v.to_string_lossy().into_owned(),
            None => "<unset>".to_string(),
        };
        println!("  {name:<35} {value}");
    }
}
