// libkeyboard/tests/touch_typing.rs
//
// Integration tests for typing through the touch layer into the input engine.
//
// Tests cover:
// - Taps on a QWERTY layout reaching the composer and auto-correction
// - Revert of an auto-correction through the delete key
// - Held delete key repeating
// - Shift chording and the momentary symbols switch
// - Swipe down committing the word in progress

use libkeyboard::{
    keycodes, BinaryDictionary, DictionaryBuilder, FstEngine, InputEngine, KeyboardConfig, KeyboardSession, Keyboard,
    Suggest, TouchEvent, TouchRouter,
};
use std::sync::Arc;

fn router() -> TouchRouter<KeyboardSession> {
    let blob = DictionaryBuilder::new()
        .add_word("hello", 200)
        .add_word("world", 180)
        .add_word("good", 150)
        .build()
        .unwrap();
    let mut config = KeyboardConfig::default();
    config.base_mut().large_dictionary_threshold = 0;
    config.base_mut().auto_capitalize = false;
    let suggest = Suggest::new(BinaryDictionary::new(FstEngine::from_bytes(&blob).unwrap()));
    let mut engine = InputEngine::with_config(suggest, config.base()).unwrap();
    engine.start_session();
    let session = KeyboardSession::new(engine, config.has_distinct_multitouch);
    TouchRouter::new(Arc::new(Keyboard::qwerty(40, 60)), &config, session)
}

fn key_center(router: &TouchRouter<KeyboardSession>, code: i32) -> (i32, i32) {
    let keyboard = router.keyboard();
    let index = keyboard.find_code(code).unwrap();
    keyboard.key(index).unwrap().rect.center()
}

struct Clock(u64);

impl Clock {
    fn tick(&mut self, ms: u64) -> u64 {
        self.0 += ms;
        self.0
    }
}

fn tap(router: &mut TouchRouter<KeyboardSession>, clock: &mut Clock, code: i32) {
    let (x, y) = key_center(router, code);
    // Slightly off center, as real fingers are
    let (x, y) = (x + 3, y - 2);
    router.on_touch_event(TouchEvent::down(0, x, y, clock.tick(100)));
    router.on_touch_event(TouchEvent::up(0, x, y, clock.tick(60)));
}

fn type_text(router: &mut TouchRouter<KeyboardSession>, clock: &mut Clock, text: &str) {
    for c in text.chars() {
        tap(router, clock, c as i32);
    }
}

#[test]
fn taps_compose_and_autocorrect() {
    let mut router = router();
    let mut clock = Clock(0);
    type_text(&mut router, &mut clock, "helo");
    assert_eq!(router.listener().engine().composing(), "helo");
    tap(&mut router, &mut clock, keycodes::SPACE);
    assert_eq!(router.listener().engine().text(), "hello ");
}

#[test]
fn delete_reverts_the_correction() {
    let mut router = router();
    let mut clock = Clock(0);
    type_text(&mut router, &mut clock, "helo ");
    assert_eq!(router.listener().engine().text(), "hello ");
    tap(&mut router, &mut clock, keycodes::DELETE);
    assert_eq!(router.listener().engine().text(), "");
    assert_eq!(router.listener().engine().composing(), "helo");
}

#[test]
fn held_delete_repeats() {
    let mut router = router();
    let mut clock = Clock(0);
    type_text(&mut router, &mut clock, "abcdefg");
    let (x, y) = key_center(&router, keycodes::DELETE);
    let down = clock.tick(100);
    router.on_touch_event(TouchEvent::down(0, x, y, down));
    // Immediate delete, then repeats at +400, +450, +500 and +550
    router.on_touch_event(TouchEvent::up(0, x, y, down + 560));
    assert_eq!(router.listener().engine().composing(), "ab");
}

#[test]
fn shift_chord_capitalizes_one_letter() {
    let mut router = router();
    let mut clock = Clock(0);
    let (sx, sy) = key_center(&router, keycodes::SHIFT);
    let (hx, hy) = key_center(&router, 'h' as i32);
    router.on_touch_event(TouchEvent::down(0, sx, sy, clock.tick(100)));
    router.on_touch_event(TouchEvent::down(1, hx, hy, clock.tick(50)));
    router.on_touch_event(TouchEvent::up(1, hx, hy, clock.tick(50)));
    router.on_touch_event(TouchEvent::up(0, sx, sy, clock.tick(50)));
    tap(&mut router, &mut clock, 'i' as i32);
    assert_eq!(router.listener().engine().composing(), "Hi");
}

#[test]
fn sliding_off_mode_change_snaps_back() {
    let mut router = router();
    let (mx, my) = key_center(&router, keycodes::MODE_CHANGE);
    let (cx, cy) = key_center(&router, ',' as i32);
    router.on_touch_event(TouchEvent::down(0, mx, my, 1000));
    assert_eq!(router.listener_mut().take_mode_change(), Some(true));
    // Long press waits three times longer while the switch is momentary
    assert_eq!(router.next_deadline(), Some(2500));

    router.on_touch_event(TouchEvent::moved(0, cx, cy, 1100));
    router.on_touch_event(TouchEvent::up(0, cx, cy, 1200));
    assert_eq!(router.listener_mut().take_mode_change(), Some(false));
    assert_eq!(router.listener().engine().text(), ",");
}

#[test]
fn swipe_down_commits_the_word() {
    let mut router = router();
    let mut clock = Clock(0);
    type_text(&mut router, &mut clock, "wor");
    let start = clock.tick(100);
    router.on_touch_event(TouchEvent::down(0, 200, 10, start));
    for step in 1..=4u64 {
        router.on_touch_event(TouchEvent::moved(0, 200, 10 + 55 * step as i32, start + 20 * step));
    }
    router.on_touch_event(TouchEvent::up(0, 200, 230, start + 80));
    let engine = router.listener().engine();
    assert_eq!(engine.text(), "wor");
    assert_eq!(engine.composing(), "");
}
