use crate::config::ConfigError;

/// Data rate identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
    /// DR0, SF12 at 125 kHz
    SF12BW125,
    /// DR1, SF11 at 125 kHz
    SF11BW125,
    /// DR2, SF10 at 125 kHz
    SF10BW125,
    /// DR3, SF9 at 125 kHz
    SF9BW125,
    /// DR4, SF8 at 125 kHz
    SF8BW125,
    /// DR5, SF7 at 125 kHz
    SF7BW125,
}

impl DataRate {
    /// Data rate index (DR0-DR5)
    pub fn index(&self) -> u8 {
        *self as u8
    }

    /// Get spreading factor
    pub fn spreading_factor(&self) -> u8 {
        spreading_factor(self.index())
    }

    /// Get bandwidth in Hz
    pub fn bandwidth(&self) -> u32 {
        125_000
    }
}

impl TryFrom<u8> for DataRate {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(DataRate::SF12BW125),
            1 => Ok(DataRate::SF11BW125),
            2 => Ok(DataRate::SF10BW125),
            3 => Ok(DataRate::SF9BW125),
            4 => Ok(DataRate::SF8BW125),
            5 => Ok(DataRate::SF7BW125),
            other => Err(ConfigError::InvalidDataRate(other)),
        }
    }
}

/// Spreading factor for a raw data rate index as reported by the stack
///
/// The stack reports DR indices in its statistics; DR0 is SF12 and every step
/// up shortens the spreading factor by one.
pub fn spreading_factor(dr_index: u8) -> u8 {
    12u8.saturating_sub(dr_index)
}

/// Uplink channel definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    /// Channel index in the stack's channel table
    pub index: u8,
    /// Channel frequency in Hz
    pub frequency: u32,
    /// Minimum data rate
    pub min_dr: DataRate,
    /// Maximum data rate
    pub max_dr: DataRate,
}

impl Channel {
    const fn new(index: u8, frequency: u32) -> Self {
        Self {
            index,
            frequency,
            min_dr: DataRate::SF12BW125,
            max_dr: DataRate::SF7BW125,
        }
    }
}

/// EU868 join channels, always known to the stack
const EU868_DEFAULT_CHANNELS: [Channel; 3] = [
    Channel::new(0, 868_100_000),
    Channel::new(1, 868_300_000),
    Channel::new(2, 868_500_000),
];

/// Channels the network would normally announce in the join accept
const EU868_ABP_CHANNELS: [Channel; 5] = [
    Channel::new(3, 867_100_000),
    Channel::new(4, 867_300_000),
    Channel::new(5, 867_500_000),
    Channel::new(6, 867_700_000),
    Channel::new(7, 867_900_000),
];

/// Generic region trait
pub trait Region {
    /// Short region name, as used by network server frequency plans
    fn name(&self) -> &'static str;

    /// Channels defined by the regional parameters for every device
    fn default_channels(&self) -> &'static [Channel];

    /// Channels an ABP device has to register itself
    ///
    /// OTAA devices receive these in the join accept CFList. ABP devices skip
    /// the join accept and would otherwise transmit on the default channels only.
    fn abp_channels(&self) -> &'static [Channel];
}

/// EU868 region configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct EU868;

impl EU868 {
    /// Create a new EU868 region configuration
    pub fn new() -> Self {
        Self
    }
}

impl Region for EU868 {
    fn name(&self) -> &'static str {
        "EU868"
    }

    fn default_channels(&self) -> &'static [Channel] {
        &EU868_DEFAULT_CHANNELS
    }

    fn abp_channels(&self) -> &'static [Channel] {
        &EU868_ABP_CHANNELS
    }
}
