//! Listens for a CS104 client, answers a general interrogation, and sends
//! periodic measurement data.

use std::error::Error;
use std::time::Duration;

use tokio::time::sleep;

use rust_iec60870::asdu::Asdu;
use rust_iec60870::common::CauseOfTransmission;
use rust_iec60870::iec104::{Iec104Server, Iec104ServerConfig};
use rust_iec60870::information_object::{
    InformationObject, MeasuredScaledInfo, SinglePointInfo, TypeId,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = Iec104ServerConfig {
        bind_address: "0.0.0.0".to_string(),
        port: 2404,
        ..Iec104ServerConfig::default()
    };

    println!("listening on {}:{}...", config.bind_address, config.port);
    let server = Iec104Server::bind(config).await?;

    let mut connection = server.accept().await?;
    println!("client connected: {}", connection.peer);

    let mut counter: i16 = 0;
    loop {
        tokio::select! {
            asdu = connection.receive() => {
                let Some(asdu) = asdu else {
                    println!("connection closed");
                    break;
                };
                println!("received ASDU: {asdu:?}");

                match asdu.type_id {
                    TypeId::CIcNa1 => {
                        let confirm = Asdu::new(TypeId::CIcNa1, CauseOfTransmission::ActivationConfirmation, asdu.common_address);
                        connection.send_asdu(confirm).await?;

                        send_all_data_points(&connection).await?;

                        let termination = Asdu::new(TypeId::CIcNa1, CauseOfTransmission::ActivationTermination, asdu.common_address);
                        connection.send_asdu(termination).await?;
                    }
                    other => println!("unsupported command type: {other:?}"),
                }
            }
            _ = sleep(Duration::from_secs(5)) => {
                counter += 1;
                send_periodic_data(&connection, counter).await?;
            }
        }
    }

    Ok(())
}

async fn send_all_data_points(connection: &rust_iec60870::iec104::Iec104Connection) -> Result<(), Box<dyn Error>> {
    let mut single_points = Asdu::new(TypeId::MSpNa1, CauseOfTransmission::Spontaneous, 1);
    single_points.add_information_object(InformationObject::SinglePoint(SinglePointInfo {
        ioa: 1001,
        value: true,
        quality: Default::default(),
    }))?;
    connection.send_asdu(single_points).await?;

    let mut measured = Asdu::new(TypeId::MMeNb1, CauseOfTransmission::Spontaneous, 1);
    measured.add_information_object(InformationObject::MeasuredScaled(MeasuredScaledInfo {
        ioa: 2001,
        value: 75,
        quality: Default::default(),
    }))?;
    connection.send_asdu(measured).await?;

    Ok(())
}

async fn send_periodic_data(
    connection: &rust_iec60870::iec104::Iec104Connection,
    counter: i16,
) -> Result<(), Box<dyn Error>> {
    let mut measurement = Asdu::new(TypeId::MMeNb1, CauseOfTransmission::Periodic, 1);
    measurement.add_information_object(InformationObject::MeasuredScaled(MeasuredScaledInfo {
        ioa: 2001,
        value: counter,
        quality: Default::default(),
    }))?;
    connection.send_asdu(measurement).await?;
    println!("sent periodic measurement, counter = {counter}");
    Ok(())
}
