pub type Result<T> = std::result::Result<T, crate::error::Error>;

#[macro_export]
macro_rules! verify_arg {
    ($name:expr, $expr:expr) => {{
        let result = $expr;
        $crate::result::verify_arg(result, stringify!($name), stringify!($expr))?;
    }};
}

/// Returns an `OutOfBounds` error from the enclosing function unless
/// `index < limit`.
#[macro_export]
macro_rules! verify_bounds {
    ($element:expr, $index:expr, $limit:expr) => {{
        let index = $index as u64;
        let limit = $limit as u64;
        if index >= limit {
            return Err($crate::error::Error::out_of_bounds($element, index, limit));
        }
    }};
}

#[inline]
pub fn verify_arg(predicate: bool, name: &str, condition: &str) -> Result<()> {
    if predicate {
        Ok(())
    } else {
        invalid_arg(name, condition)
    }
}

#[cold]
pub fn invalid_arg(name: &str, condition: &str) -> Result<()> {
    Err(crate::error::ErrorKind::InvalidArgument {
        name: name.to_string(),
        message: condition.to_string(),
    }
    .into())
}
