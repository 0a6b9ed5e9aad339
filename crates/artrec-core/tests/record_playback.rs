use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use artrec_core::protocols::artnet::{decode, encode};
use artrec_core::timeline::TimelineSource;
use artrec_core::{
    Config, Delta, MergeMode, Mode, PortAddress, Session, TimelineReader, WorkDir, summarize,
};

fn config(dir: &Path) -> Config {
    Config {
        max_dmx_address: 16,
        universe: 2,
        working_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

fn session(dir: &Path) -> Session {
    Session::new(config(dir), WorkDir::open(dir).unwrap()).unwrap()
}

fn address() -> PortAddress {
    PortAddress::new(0, 0, 2).unwrap()
}

fn frame(values: &[u8]) -> Vec<u8> {
    encode(address(), values).unwrap()
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn recorded_changes_replay_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();

    let mut recording = session(dir.path());
    recording.handle_datagram(&frame(&[0, 0, 0, 0, 10]), t0);
    assert_eq!(recording.set_mode(Mode::Record, t0), Mode::Record);

    recording.handle_datagram(&frame(&[0, 0, 0, 0, 10]), t0 + ms(50));
    recording.handle_datagram(&frame(&[255, 0, 0, 0, 10]), t0 + ms(100));
    recording.handle_datagram(&frame(&[255, 0, 0, 0, 20]), t0 + ms(350));
    let name = recording.control_state().timeline.expect("recording name");
    recording.set_mode(Mode::Idle, t0 + ms(400));

    let mut reader = TimelineReader::open(&dir.path().join(&name)).unwrap();
    let first = reader.next_event().unwrap().expect("first event");
    let second = reader.next_event().unwrap().expect("second event");
    assert_eq!(first.offset_ms, 0);
    assert_eq!(first.deltas, vec![Delta::new(1, 255)]);
    assert_eq!(second.offset_ms, 250);
    assert_eq!(second.deltas, vec![Delta::new(5, 20)]);
    assert_eq!(reader.next_event().unwrap(), None);

    let mut playback = session(dir.path());
    playback.select_timeline(name);
    let p0 = t0 + ms(1_000);
    assert_eq!(playback.set_mode(Mode::Playback, p0), Mode::Playback);

    let out = playback.tick(p0).expect("first frame");
    let decoded = decode(&out).unwrap();
    assert_eq!(decoded.address, address());
    assert_eq!(decoded.data.len(), 16);
    assert_eq!(decoded.data[0], 255);

    assert!(playback.tick(p0 + ms(100)).is_none());
    let out = playback.tick(p0 + ms(250)).expect("second frame");
    assert_eq!(decode(&out).unwrap().data[4], 20);
    assert_eq!(playback.mode(), Mode::Idle);
}

#[test]
fn playback_keeps_live_values_under_htp() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("fade.jsonl"),
        "{\"0\":[{\"channel\":1,\"value\":3}]}\n{\"40\":[{\"channel\":1,\"value\":9}]}\n",
    )
    .unwrap();
    let t0 = Instant::now();
    let mut session = session(dir.path());
    session.handle_datagram(&frame(&[5]), t0);
    session.set_merge_mode(MergeMode::Htp);
    session.select_timeline("fade.jsonl");
    session.set_mode(Mode::Playback, t0);

    let first = decode(&session.tick(t0).unwrap()).unwrap();
    assert_eq!(first.data[0], 5);
    let second = decode(&session.tick(t0 + ms(40)).unwrap()).unwrap();
    assert_eq!(second.data[0], 9);
}

#[test]
fn loop_playback_restarts_until_stopped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("loop.jsonl"),
        "{\"0\":[{\"channel\":1,\"value\":1}]}\n{\"20\":[{\"channel\":1,\"value\":2}]}\n",
    )
    .unwrap();
    let t0 = Instant::now();
    let mut session = session(dir.path());
    session.set_loop(true);
    session.select_timeline("loop.jsonl");
    session.set_mode(Mode::Playback, t0);

    let mut values = Vec::new();
    for step in 0..6 {
        if let Some(packet) = session.tick(t0 + ms(step * 20)) {
            values.push(decode(&packet).unwrap().data[0]);
        }
    }
    assert_eq!(values, vec![1, 2, 1, 2, 1, 2]);
    assert_eq!(session.mode(), Mode::Playback);

    session.set_mode(Mode::Idle, t0 + ms(200));
    assert!(session.tick(t0 + ms(220)).is_none());
}

#[test]
fn corrupt_line_stops_playback_after_valid_events() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("broken.jsonl"),
        "{\"0\":[{\"channel\":1,\"value\":1}]}\nnot json\n",
    )
    .unwrap();
    let t0 = Instant::now();
    let mut session = session(dir.path());
    session.select_timeline("broken.jsonl");
    session.set_mode(Mode::Playback, t0);

    assert!(session.tick(t0).is_some());
    assert_eq!(session.mode(), Mode::Idle);
}

#[test]
fn read_only_directory_never_records() {
    let dir = tempfile::tempdir().unwrap();
    let workdir = WorkDir::open(dir.path()).unwrap().with_writable(false);
    let mut session = Session::new(config(dir.path()), workdir).unwrap();
    let t0 = Instant::now();

    assert_eq!(session.set_mode(Mode::Record, t0), Mode::Idle);
    session.handle_datagram(&frame(&[1, 2, 3]), t0);
    assert_eq!(session.buffer().get(2), Some(2));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn foreign_universe_does_not_reach_the_recording() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();
    let mut session = session(dir.path());
    session.set_mode(Mode::Record, t0);

    let other = PortAddress::new(0, 0, 3).unwrap();
    session.handle_datagram(&encode(other, &[9, 9, 9]).unwrap(), t0);
    session.handle_datagram(&frame(&[0, 4]), t0 + ms(10));
    let path = session.recording_path().unwrap().to_path_buf();
    session.set_mode(Mode::Idle, t0 + ms(20));

    let summary = summarize(&path).unwrap();
    assert_eq!(summary.events, 1);
    assert_eq!(summary.channels, vec![2]);
    assert_eq!(session.buffer().get(1), Some(0));
}
