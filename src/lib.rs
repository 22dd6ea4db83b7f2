//! # rust-iec60870
//!
//! A Rust implementation of the IEC 60870-5 protocols for SCADA communications.
//!
//! This crate provides functionality for implementing IEC 60870-5-101 and IEC 60870-5-104
//! protocols, which are widely used in power utility automation systems.
//!
//! ## Features
//!
//! - IEC 60870-5-104 protocol implementation (TCP/IP-based)
//! - Asynchronous API using Tokio
//! - Type-safe ASDU handling
//! - Comprehensive error handling
//! - Well-documented codebase
//! - Designed for embedded and server-side applications
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rust_iec60870::iec104::{Iec104Client, Iec104ClientConfig};
//! use rust_iec60870::common::CauseOfTransmission;
//! use rust_iec60870::asdu::Asdu;
//! use rust_iec60870::information_object::{InformationObject, InterrogationCommandInfo, QualifierOfInterrogation, TypeId};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Configure and connect the client
//!     let config = Iec104ClientConfig::new()
//!         .host("192.168.1.100")
//!         .port(2404)
//!         .timeout(Duration::from_secs(5))
//!         .max_retries(3)
//!         .build()?;
//!     let mut client = Iec104Client::connect(config).await?;
//!
//!     // Start data transfer
//!     client.start_data_transfer().await?;
//!
//!     // Send a general interrogation command
//!     let common_addr = 1;
//!     let mut asdu = Asdu::new(TypeId::CIcNa1, CauseOfTransmission::Activation, common_addr);
//!     asdu.add_information_object(InformationObject::InterrogationCommand(InterrogationCommandInfo {
//!         ioa: 0,
//!         qoi: QualifierOfInterrogation::STATION,
//!     }))?;
//!     client.send_asdu(asdu).await?;
//!
//!     // Process received data
//!     if let Some(data) = client.receive().await {
//!         println!("Received ASDU: {:?}", data);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod time;
pub mod information_object;
pub mod asdu;
pub mod ft12;
pub mod link_layer;
pub mod iec104;
#[cfg(feature = "iec101")]
pub mod iec101;

// Re-export common types for convenience
pub use crate::common::{
    ApplicationLayerParameters, CauseOfTransmission, CommonAddrSize, IecError, IecResult,
    InfoObjAddrSize, QualityDescriptor,
};
pub use crate::asdu::Asdu;
pub use crate::information_object::{InformationObject, TypeId};
pub use crate::iec104::{ApciType, Apdu, Iec104Client, Iec104ClientConfig}; 