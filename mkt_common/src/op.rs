/// Implements the arithmetic operator traits for single-field newtypes.
#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl std::ops::$impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(std::ops::$impl_trait::$impl_fn(self.0, rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl std::ops::$impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                std::ops::$impl_trait::$impl_fn(&mut self.0, rhs.0)
            }
        }
    };

    (unary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl std::ops::$impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self) -> Self::Output {
                Self(std::ops::$impl_trait::$impl_fn(self.0))
            }
        }
    };
}
