mod common;

use common::{configured, MemoryStorage};
use ledctl::settings::{CONSTANT, DEFAULT_BOUNDS, DEFAULT_PERIOD, LAYOUT_SIZE};
use ledctl::{
    AnimationMode, Bounds, BrightnessSource, ChannelConfig, PeriodSource, Settings,
};

#[test]
fn layout_size() {
    assert_eq!(LAYOUT_SIZE, 54);
}

#[test]
fn loads_configured_store() {
    let mut bytes = configured();
    bytes[1] = 2; // led 1 brightness from input 2
    bytes[7 + 1] = 77;
    bytes[14 + 3] = 3; // led 3 short pulse
    bytes[21 + 4] = 0; // led 4 period from input 0
    bytes[28 + 2 * 5..30 + 2 * 5].copy_from_slice(&300u16.to_le_bytes());
    bytes[42 + 2..44 + 2].copy_from_slice(&1200u16.to_le_bytes());
    bytes[48 + 2..50 + 2].copy_from_slice(&1800u16.to_le_bytes());

    let settings = Settings::load(MemoryStorage::from_bytes(bytes)).unwrap();

    assert_eq!(settings.output(1).brightness, BrightnessSource::Signal(2));
    assert_eq!(settings.output(0).brightness, BrightnessSource::Constant(255));
    assert_eq!(settings.output(3).mode, AnimationMode::ShortPulse);
    assert_eq!(settings.output(4).period, PeriodSource::Signal(0));
    assert_eq!(settings.output(5).period, PeriodSource::Constant(300));
    assert_eq!(settings.bounds(1), Bounds { min: 1200, max: 1800 });
    assert_eq!(settings.bounds(0), Bounds { min: 1000, max: 2000 });
    assert!(settings.storage().writes.is_empty());
}

#[test]
fn erased_store_loads_sane_defaults() {
    let settings = Settings::load(MemoryStorage::erased()).unwrap();
    for led in 0..7 {
        assert_eq!(
            *settings.output(led),
            ChannelConfig {
                brightness: BrightnessSource::Constant(255),
                mode: AnimationMode::Direct,
                period: PeriodSource::Constant(DEFAULT_PERIOD),
            }
        );
    }
    assert_eq!(settings.all_bounds(), [DEFAULT_BOUNDS; 3]);
    assert_eq!(*settings.output(0), ChannelConfig::default());
    // Sanitizing does not write anything back.
    assert!(settings.storage().writes.is_empty());
}

#[test]
fn out_of_range_bytes_are_clamped() {
    let mut bytes = configured();
    bytes[14] = 9;
    bytes[0] = 3;
    bytes[42..44].copy_from_slice(&2500u16.to_le_bytes());
    let settings = Settings::load(MemoryStorage::from_bytes(bytes)).unwrap();
    assert_eq!(settings.output(0).mode, AnimationMode::Direct);
    assert_eq!(settings.output(0).brightness, BrightnessSource::Constant(255));
    assert_eq!(settings.bounds(0), DEFAULT_BOUNDS);
}

#[test]
fn setters_write_only_changed_fields() {
    let mut settings = Settings::load(MemoryStorage::from_bytes(configured())).unwrap();

    settings
        .set_brightness_source(2, BrightnessSource::Constant(255))
        .unwrap();
    settings.set_animation_mode(2, AnimationMode::Direct).unwrap();
    settings.set_period_source(2, PeriodSource::Constant(10)).unwrap();
    settings.set_bounds(2, Bounds { min: 1000, max: 2000 }).unwrap();
    assert!(settings.storage().writes.is_empty());

    settings.set_animation_mode(2, AnimationMode::Blink).unwrap();
    settings.set_min(1, 990).unwrap();
    settings.set_period_source(6, PeriodSource::Constant(513)).unwrap();

    let writes = &settings.storage().writes;
    assert_eq!(
        *writes,
        vec![
            (14 + 2, vec![2]),
            (42 + 2, 990u16.to_le_bytes().to_vec()),
            (28 + 12, 513u16.to_le_bytes().to_vec()),
        ]
    );
    assert_eq!(settings.output(2).mode, AnimationMode::Blink);
    assert_eq!(settings.bounds(1).min, 990);
}

#[test]
fn signal_source_keeps_stored_constant() {
    let mut settings = Settings::load(MemoryStorage::from_bytes(configured())).unwrap();

    settings
        .set_brightness_source(0, BrightnessSource::Signal(1))
        .unwrap();
    assert_eq!(settings.storage().writes, vec![(0, vec![1])]);
    assert_eq!(settings.storage().bytes[7], 255);

    settings
        .set_brightness_source(0, BrightnessSource::Constant(255))
        .unwrap();
    assert_eq!(settings.storage().writes.len(), 2);
    assert_eq!(settings.storage().writes[1], (0, vec![CONSTANT]));

    settings.set_period_source(0, PeriodSource::Signal(7)).unwrap();
    assert_eq!(settings.output(0).period, PeriodSource::Signal(2));
}

#[test]
fn written_values_survive_reload() {
    let mut settings = Settings::load(MemoryStorage::erased()).unwrap();
    settings
        .set_brightness_source(6, BrightnessSource::Constant(12))
        .unwrap();
    settings.set_animation_mode(6, AnimationMode::InverseBlink).unwrap();
    settings.set_period_source(6, PeriodSource::Constant(42)).unwrap();
    settings.set_bounds(0, Bounds { min: 1100, max: 1900 }).unwrap();

    let reloaded = Settings::load(settings.into_storage()).unwrap();
    assert_eq!(
        *reloaded.output(6),
        ChannelConfig {
            brightness: BrightnessSource::Constant(12),
            mode: AnimationMode::InverseBlink,
            period: PeriodSource::Constant(42),
        }
    );
    assert_eq!(reloaded.bounds(0), Bounds { min: 1100, max: 1900 });
}

#[test]
fn defaults_are_persisted_when_chosen_on_erased_store() {
    // The in-memory bounds are the defaults, but storage is still erased.
    let mut settings = Settings::load(MemoryStorage::erased()).unwrap();
    settings.set_bounds(1, DEFAULT_BOUNDS).unwrap();
    assert_eq!(settings.storage().writes.len(), 2);
    assert_eq!(settings.storage().word(44), DEFAULT_BOUNDS.min);
    assert_eq!(settings.storage().word(50), DEFAULT_BOUNDS.max);
}
