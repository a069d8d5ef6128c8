use super::ConfigError;

/// Constructor validation lifecycle shared by kernel structs.
///
/// Everything that can be checked without touching sample data (axis range,
/// transform length, option combinations) is checked here, once.
pub trait KernelLifecycle: Sized {
    /// Kernel config type.
    type Config;

    /// Construct a validated kernel from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}
