//! CS101 master example, driving a single slave over a TCP-based serial
//! gateway (a common way to reach an RS-232/485 device without a direct
//! UART). Swap `TcpSerialPort` for an implementation over a real serial
//! device to run this against actual hardware.

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use rust_iec60870::asdu::Asdu;
use rust_iec60870::common::CauseOfTransmission;
use rust_iec60870::information_object::{
    InformationObject, InterrogationCommandInfo, QualifierOfInterrogation,
    ResetProcessCommandInfo, TypeId,
};
use rust_iec60870::iec101::{Iec101Config, Iec101Master, SerialPort};
use rust_iec60870::{IecError, IecResult};

struct TcpSerialPort(TcpStream);

#[async_trait]
impl SerialPort for TcpSerialPort {
    async fn read(&mut self, buf: &mut [u8]) -> IecResult<usize> {
        self.0.read(buf).await.map_err(IecError::IoError)
    }

    async fn write_all(&mut self, data: &[u8]) -> IecResult<()> {
        self.0.write_all(data).await.map_err(IecError::IoError)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    println!("connecting to serial gateway at 127.0.0.1:20000...");
    let stream = TcpStream::connect("127.0.0.1:20000").await?;
    let port = TcpSerialPort(stream);

    let config = Iec101Config {
        link_response_timeout: Duration::from_secs(2),
        max_retries: 3,
        ..Iec101Config::default()
    };

    let slave_address = 1;
    let mut master = Iec101Master::new(port, &config);
    master.add_slave(slave_address, &config);

    println!("sending reset process command...");
    let mut reset = Asdu::new(TypeId::CRpNa1, CauseOfTransmission::Activation, 1);
    reset.add_information_object(InformationObject::ResetProcessCommand(ResetProcessCommandInfo {
        ioa: 0,
        qrp: 1,
    }))?;
    master.send_asdu(slave_address, &reset).await?;

    println!("sending station interrogation command...");
    let mut interrogation = Asdu::new(TypeId::CIcNa1, CauseOfTransmission::Activation, 1);
    interrogation.add_information_object(InformationObject::InterrogationCommand(InterrogationCommandInfo {
        ioa: 0,
        qoi: QualifierOfInterrogation::STATION,
    }))?;
    master.send_asdu(slave_address, &interrogation).await?;

    println!("polling for responses (Ctrl+C to exit)...");
    loop {
        master.handle_timeouts().await?;
        if let Some((address, asdu)) = master.poll_next_slave().await? {
            println!("received ASDU from slave {address}: {asdu:?}");
            process_asdu(&asdu);

            if asdu.type_id == TypeId::CIcNa1 && asdu.cot == CauseOfTransmission::ActivationTermination {
                println!("station interrogation completed");
                break;
            }
        }
    }

    Ok(())
}

fn process_asdu(asdu: &Asdu) {
    match asdu.type_id {
        TypeId::MSpNa1 => {
            for io in asdu.information_objects() {
                if let InformationObject::SinglePoint(info) = io {
                    println!("    - ioa: {}, value: {}", info.ioa, info.value);
                }
            }
        }
        TypeId::MDpNa1 => {
            for io in asdu.information_objects() {
                if let InformationObject::DoublePoint(info) = io {
                    println!("    - ioa: {}, value: {:?}", info.ioa, info.value);
                }
            }
        }
        TypeId::MMeNa1 => {
            for io in asdu.information_objects() {
                if let InformationObject::MeasuredNormalized(info) = io {
                    println!("    - ioa: {}, value: {:?}", info.ioa, info.value);
                }
            }
        }
        TypeId::MMeNb1 => {
            for io in asdu.information_objects() {
                if let InformationObject::MeasuredScaled(info) = io {
                    println!("    - ioa: {}, value: {}", info.ioa, info.value);
                }
            }
        }
        other => println!("  - other type: {other:?}"),
    }
}
