// Poll / collision-resolution / removal cycle against the simulated front-end.
//
// Run with `RUST_LOG=debug cargo run --example poll_cycle` to see the
// loop's own logging.

use anyhow::Context;
use discloop::prelude::*;
use discloop::test_support::MockRig;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let rig = MockRig::new();
    rig.p3a.add_card(&[0x04, 0xA1, 0xB2, 0xC3], 0x20);
    rig.felica.add_card(
        [0x01, 0x2E, 0x4C, 0xD1, 0xA2, 0xB3, 0xC4, 0xD5],
        [0x01, 0x20, 0x22, 0x04, 0x27, 0x67, 0x4E, 0xFF],
    );
    let mut dl = rig.build();

    println!("Polling...");
    let status = dl.run(EntryPoint::Poll).context("detection")?;
    println!("  {} (techs: {:#04x})", status, dl.detected_techs().bits());

    if status == Status::MultiTechDetected {
        dl.set_config(ConfigKey::NextPollState, PollState::CollisionResolution)?;
        let status = dl.run(EntryPoint::Poll).context("collision resolution")?;
        println!("  {} ({} card(s))", status, dl.num_of_cards());
    }

    for tag in &dl.targets().type_a.tags {
        println!("  Type A UID {} SAK {:02X}", bytes_to_hex(tag.uid.as_bytes()), tag.sak);
    }
    let ats = &dl.targets().type_a.i3p4.ats;
    if !ats.is_empty() {
        println!("  ATS {}", bytes_to_hex_spaced(ats));
    }

    dl.set_config(ConfigKey::NextPollState, PollState::Removal)?;
    let status = dl.run(EntryPoint::Poll).context("removal")?;
    println!("Removal check: {}", status);
    Ok(())
}
