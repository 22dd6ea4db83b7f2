//! Error handling patterns for this crate: `?` propagation, matching on
//! `IecError` variants, and deciding which failures are worth retrying.

use std::error::Error;
use std::time::Duration;

use rust_iec60870::asdu::Asdu;
use rust_iec60870::common::CauseOfTransmission;
use rust_iec60870::iec104::{Iec104Client, Iec104ClientConfig};
use rust_iec60870::information_object::{
    InformationObject, QualifierOfCommand, SingleCommandInfo, TypeId,
};
use rust_iec60870::IecError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    println!("Example 1: basic error propagation with ?");
    match basic_error_propagation().await {
        Ok(()) => println!("success"),
        Err(e) => println!("error: {e}"),
    }

    println!("\nExample 2: matching on specific IecError variants");
    match detailed_error_handling().await {
        Ok(()) => println!("success"),
        Err(IecError::TimeoutError(detail)) => println!("timed out: {detail}"),
        Err(IecError::ConnectionError(detail)) => println!("connection failed: {detail}"),
        Err(IecError::ProtocolError(detail)) => println!("protocol error: {detail}"),
        Err(e) => println!("other error: {e}"),
    }

    println!("\nExample 3: retrying a connection with a longer timeout");
    match connect_with_retry().await {
        Ok(_client) => println!("connected on retry"),
        Err(e) => println!("gave up: {e}"),
    }

    Ok(())
}

/// `?` propagates the first error unchanged.
async fn basic_error_propagation() -> Result<(), IecError> {
    let config = Iec104ClientConfig::new()
        .host("192.168.1.100")
        .port(2404)
        .timeout(Duration::from_secs(5))
        .build()?;

    let mut client = Iec104Client::connect(config).await?;
    client.start_data_transfer().await?;
    Ok(())
}

/// Matching lets the caller treat different failure classes differently:
/// a timeout is worth a retry, a malformed response usually is not.
async fn detailed_error_handling() -> Result<(), IecError> {
    let config = Iec104ClientConfig::new()
        .host("192.168.1.100")
        .port(2404)
        .timeout(Duration::from_secs(1))
        .build()?;

    let mut client = Iec104Client::connect(config).await?;
    client.start_data_transfer().await?;

    let mut command = Asdu::new(TypeId::CScNa1, CauseOfTransmission::Activation, 1);
    command.add_information_object(InformationObject::SingleCommand(SingleCommandInfo {
        ioa: 1001,
        value: true,
        qualifier: QualifierOfCommand { qu: 0, select: false },
    }))?;

    match client.send_asdu(command).await {
        Ok(()) => println!("command sent"),
        Err(IecError::DataTransferNotStarted) => {
            println!("data transfer was not active; this call should follow start_data_transfer");
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// A connection attempt that times out quickly is retried once with a
/// longer budget rather than failing the whole operation outright.
async fn connect_with_retry() -> Result<Iec104Client, IecError> {
    let short_config = Iec104ClientConfig::new()
        .host("192.168.1.100")
        .port(2404)
        .timeout(Duration::from_secs(1))
        .build()?;

    match Iec104Client::connect(short_config).await {
        Ok(client) => Ok(client),
        Err(IecError::TimeoutError(detail)) => {
            println!("connection timed out ({detail}); retrying with a 10s budget");
            let long_config = Iec104ClientConfig::new()
                .host("192.168.1.100")
                .port(2404)
                .timeout(Duration::from_secs(10))
                .build()?;
            Iec104Client::connect(long_config).await
        }
        Err(e) => Err(e),
    }
}
