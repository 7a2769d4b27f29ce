//! Tiny macro for forwarding arithmetic operator impls to a newtype's inner value.

#[macro_export]
macro_rules! op {
    (binary $ty:ident, $op:ident, $fn:ident) => {
        impl std::ops::$op for $ty {
            type Output = Self;

            fn $fn(self, rhs: Self) -> Self::Output {
                Self(std::ops::$op::$fn(self.0, rhs.0))
            }
        }
    };
    (inplace $ty:ident, $op:ident, $fn:ident) => {
        impl std::ops::$op for $ty {
            fn $fn(&mut self, rhs: Self) {
                std::ops::$op::$fn(&mut self.0, rhs.0)
            }
        }
    };
    (unary $ty:ident, $op:ident, $fn:ident) => {
        impl std::ops::$op for $ty {
            type Output = Self;

            fn $fn(self) -> Self::Output {
                Self(std::ops::$op::$fn(self.0))
            }
        }
    };
}
