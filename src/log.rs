// defmt needs a global logger and its linker script, neither of which exist on
// the host. These forward to defmt only when the feature is on.

macro_rules! debug {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)+);
    );
}

macro_rules! info {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::info!($($arg)+);
    );
}

// Not `warn`, which would clash with the lint attribute of the same name
macro_rules! warning {
    ( $($arg:tt)+ ) => (
        #[cfg(feature = "defmt")]
        defmt::warn!($($arg)+);
    );
}

pub(crate) use {debug, info, warning};
