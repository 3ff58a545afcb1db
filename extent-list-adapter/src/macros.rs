// Logging shims. Without the `tracing` feature these expand to nothing.

macro_rules! vtrace {
    ($($tt:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::trace!(target: "extent_list_adapter", $($tt)*);
        }
    };
}

macro_rules! vdebug {
    ($($tt:tt)*) => {
        #[cfg(feature = "tracing")]
        {
            tracing::debug!(target: "extent_list_adapter", $($tt)*);
        }
    };
}
