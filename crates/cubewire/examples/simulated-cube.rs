//! Drive a simulated cube end to end.
//!
//! ```text
//! cargo run -p cubewire --example simulated-cube --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use cubewire::cube::{Cube, Topic};
use cubewire::frame::{LightOperation, MoveToOptions, MoveToTarget, SoundOperation};
use cubewire::transport::{CharacteristicId, MemoryTransport};
use cubewire::Settings;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_json(r#"{ "log": { "level": "debug" } }"#)?;
    settings.init_logging();

    let transport = Arc::new(MemoryTransport::new("simulated-cube"));
    transport.set_write_responder(CharacteristicId::Configuration, |request| {
        (request == [0x01, 0x00]).then(|| b"\x81\x002.1.0".to_vec())
    });
    transport.set_write_responder(CharacteristicId::Motor, |request| {
        (request[0] == 0x04).then(|| vec![0x84, request[1], 0x00])
    });

    let mut cube = Cube::new(transport.clone(), settings.cube.clone());
    cube.connect()?;
    let events = cube.subscribe(&[]);

    cube.turn_on_light(&LightOperation::new(500, 0, 128, 255))?;
    cube.play_sound(
        &[SoundOperation::new(200, 60), SoundOperation::new(200, 67)],
        1,
    )?;
    cube.move_wheels(40, 40, 300)?;

    let response = cube.move_to(
        &[MoveToTarget {
            x: Some(200),
            y: Some(200),
            ..MoveToTarget::default()
        }],
        MoveToOptions::default(),
    )?;
    println!("move-to {} finished with reason {}", response.operation_id, response.reason);

    transport.notify(CharacteristicId::Sensor, &[0x01, 0x01, 0x01, 0x00, 0x01]);
    transport.notify(CharacteristicId::Battery, &[88]);

    while let Some(event) = events.recv_timeout(Duration::from_millis(50)) {
        if event.topic() != Topic::MotorResponse {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    cube.disconnect()?;
    Ok(())
}
