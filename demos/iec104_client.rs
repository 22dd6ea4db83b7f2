//! Connects to a CS104 server, starts data transfer, sends a single
//! command, and prints whatever ASDUs come back.

use std::error::Error;
use std::time::Duration;

use rust_iec60870::asdu::Asdu;
use rust_iec60870::common::{CauseOfTransmission, QualityDescriptor};
use rust_iec60870::iec104::{ConnectionStatusEvent, Iec104Client, Iec104ClientConfig};
use rust_iec60870::information_object::{
    InformationObject, QualifierOfCommand, SingleCommandInfo, TypeId,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let config = Iec104ClientConfig::new()
        .host("192.168.1.100")
        .port(2404)
        .timeout(Duration::from_secs(30))
        .max_retries(3)
        .build()?;

    println!("connecting to IEC 60870-5-104 server...");
    let mut client = Iec104Client::connect(config).await?;
    println!("connected");

    println!("starting data transfer...");
    client.start_data_transfer().await?;

    println!("sending single command...");
    let command = create_single_command(1001, true);
    client.send_asdu(command).await?;

    println!("waiting for responses (Ctrl+C to exit)...");
    let mut count = 0;
    loop {
        tokio::select! {
            asdu = client.receive() => match asdu {
                Some(asdu) => {
                    count += 1;
                    println!("received ASDU #{count}: {asdu:?}");
                    process_asdu(&asdu);
                }
                None => {
                    println!("connection closed");
                    break;
                }
            },
            event = client.next_status_event() => {
                if let Some(ConnectionStatusEvent::Closed) = event {
                    println!("connection closed");
                    break;
                }
            },
        }
    }

    Ok(())
}

fn create_single_command(ioa: u32, value: bool) -> Asdu {
    let mut asdu = Asdu::new(TypeId::CScNa1, CauseOfTransmission::Activation, 1);
    asdu.add_information_object(InformationObject::SingleCommand(SingleCommandInfo {
        ioa,
        value,
        qualifier: QualifierOfCommand { qu: 0, select: false },
    }))
    .expect("single command matches the ASDU's own type");
    asdu
}

fn process_asdu(asdu: &Asdu) {
    match asdu.type_id {
        TypeId::MSpNa1 => {
            println!("  - single point information");
            for io in asdu.information_objects() {
                if let InformationObject::SinglePoint(info) = io {
                    print_quality(info.ioa, info.value, &info.quality);
                }
            }
        }
        TypeId::MMeNb1 => {
            println!("  - measured value (scaled)");
            for io in asdu.information_objects() {
                if let InformationObject::MeasuredScaled(info) = io {
                    println!("    - ioa: {}, value: {}", info.ioa, info.value);
                }
            }
        }
        TypeId::CScNa1 => {
            println!("  - single command confirmation");
            match asdu.cot {
                CauseOfTransmission::ActivationConfirmation => println!("    - confirmed by the remote device"),
                CauseOfTransmission::ActivationTermination => println!("    - execution completed"),
                other => println!("    - cause of transmission: {other:?}"),
            }
        }
        other => println!("  - other type ({})", other.to_u8()),
    }
}

fn print_quality(ioa: u32, value: bool, quality: &QualityDescriptor) {
    println!("    - ioa: {ioa}, value: {value}, good: {}", quality.is_good());
}
