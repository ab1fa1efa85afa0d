use crate::stack::Activation;

/// EUI-64 (8 bytes)
pub type Eui64 = [u8; 8];
/// AES-128 key (16 bytes)
pub type AesKey = [u8; 16];

/// Device address (4 bytes, most significant byte first)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DevAddr([u8; 4]);

impl DevAddr {
    /// Create a device address from its big-endian bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Address as the 32-bit integer the stack expects
    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

/// Credential field that failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// OTAA application EUI
    AppEui,
    /// OTAA application key
    AppKey,
    /// ABP device address
    DevAddr,
    /// ABP network session key
    NwkSKey,
    /// ABP application session key
    AppSKey,
}

/// Configuration error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Hex string has the wrong number of digits for the field
    InvalidLength {
        /// Offending field
        field: Field,
        /// Expected number of bytes
        expected: usize,
    },
    /// Hex string contains a non-hex character
    InvalidHex(Field),
    /// Data rate index outside DR0..DR5
    InvalidDataRate(u8),
}

/// Credentials for one of the two activation modes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Credentials {
    /// Over-the-air activation: session keys are negotiated with the network
    Otaa {
        /// Application EUI
        app_eui: Eui64,
        /// Application key
        app_key: AesKey,
    },
    /// Activation by personalization: pre-shared session keys
    Abp {
        /// Device address
        dev_addr: DevAddr,
        /// Network session key
        nwk_skey: AesKey,
        /// Application session key
        app_skey: AesKey,
    },
}

impl Credentials {
    /// Create OTAA credentials
    pub fn new_otaa(app_eui: Eui64, app_key: AesKey) -> Self {
        Self::Otaa { app_eui, app_key }
    }

    /// Create ABP credentials
    pub fn new_abp(dev_addr: DevAddr, nwk_skey: AesKey, app_skey: AesKey) -> Self {
        Self::Abp {
            dev_addr,
            nwk_skey,
            app_skey,
        }
    }

    /// Decode OTAA credentials as copied from the network server console
    pub fn otaa_from_hex(app_eui: &str, app_key: &str) -> Result<Self, ConfigError> {
        Ok(Self::Otaa {
            app_eui: decode(Field::AppEui, app_eui)?,
            app_key: decode(Field::AppKey, app_key)?,
        })
    }

    /// Decode ABP credentials as copied from the network server console
    pub fn abp_from_hex(dev_addr: &str, nwk_skey: &str, app_skey: &str) -> Result<Self, ConfigError> {
        Ok(Self::Abp {
            dev_addr: DevAddr::new(decode(Field::DevAddr, dev_addr)?),
            nwk_skey: decode(Field::NwkSKey, nwk_skey)?,
            app_skey: decode(Field::AppSKey, app_skey)?,
        })
    }

    /// Whether these credentials use over-the-air activation
    pub fn is_otaa(&self) -> bool {
        matches!(self, Self::Otaa { .. })
    }
}

fn decode<const N: usize>(field: Field, text: &str) -> Result<[u8; N], ConfigError> {
    let text = text.trim();
    if text.len() != N * 2 {
        return Err(ConfigError::InvalidLength { field, expected: N });
    }

    let mut bytes = [0u8; N];
    hex::decode_to_slice(text, &mut bytes).map_err(|_| ConfigError::InvalidHex(field))?;
    Ok(bytes)
}

impl From<&Credentials> for Activation {
    fn from(credentials: &Credentials) -> Self {
        match *credentials {
            Credentials::Otaa { app_eui, app_key } => Activation::Otaa { app_eui, app_key },
            Credentials::Abp {
                dev_addr,
                nwk_skey,
                app_skey,
            } => Activation::Abp {
                dev_addr,
                nwk_skey,
                app_skey,
            },
        }
    }
}
