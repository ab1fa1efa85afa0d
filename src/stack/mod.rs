/// Stack interface, events and statistics
pub mod traits;

pub use traits::{
    Activation, Downlink, EventHandler, EventSource, Events, LoRaStack, Platform, SendError, Stats,
};
