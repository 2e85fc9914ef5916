//! Drives the interactive popup through its whole repertoire — intro,
//! keyboard avoidance, drag + snap-back, flick-to-dismiss — against a
//! logging host, with a real 60 fps frame pump. Run with
//! `RUST_LOG=debug` to watch the state machine.

use std::rc::Rc;
use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use overdrop_core::{Clock, FrameClock, Size, SystemClock, Vec2};
use overdrop_popup::{
    ContentPanel, GestureKind, HostScreen, InteractivePopup, KeyboardNotifier, PopupConfig,
    PopupView,
};

struct TerminalHost {
    size: Size,
}

impl HostScreen for TerminalHost {
    fn bounds(&self) -> Size {
        self.size
    }

    fn present(&self, view: Rc<PopupView>) {
        log::info!(
            "host: presented popup (corner radius {})",
            view.corner_radius
        );
    }

    fn dismiss(&self, _view: &PopupView, completion: Box<dyn FnOnce()>) {
        log::info!("host: popup removed from screen");
        completion();
    }
}

struct CardPanel;

impl ContentPanel for CardPanel {
    fn preferred_size(&self, max: Size) -> Size {
        Size {
            width: max.width,
            height: 220.0,
        }
    }
}

fn pump(frames: &FrameClock, popup: &InteractivePopup, n: u32) {
    let clock = SystemClock;
    for _ in 0..n {
        frames.tick(clock.now());
        sleep(Duration::from_millis(16));
    }
    let rect = popup.view().container.get();
    log::info!(
        "state {:?}, offset {:+.1}, container y {:.1}",
        popup.state(),
        popup.swipe_offset(),
        rect.y
    );
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()?;

    let frames = Rc::new(FrameClock::new());
    let keyboard = Rc::new(KeyboardNotifier::new());
    let popup = InteractivePopup::new(
        Rc::new(CardPanel),
        PopupConfig::new().corner_radius(12.0),
        frames.clone(),
        keyboard.clone(),
    );
    let host = Rc::new(TerminalHost {
        size: Size {
            width: 400.0,
            height: 800.0,
        },
    });

    log::info!("--- show + intro ---");
    popup.show(host);
    pump(&frames, &popup, 45);

    log::info!("--- keyboard appears and leaves ---");
    keyboard.notify_will_show(300.0);
    pump(&frames, &popup, 25);
    assert!(!popup.gesture_should_begin(GestureKind::Pan, Vec2 { x: 0.0, y: 0.0 }));
    keyboard.notify_will_hide();
    pump(&frames, &popup, 25);

    log::info!("--- slow drag, snaps back ---");
    popup.pan_began();
    for i in 1..=10 {
        popup.pan_changed(Vec2 {
            x: 0.0,
            y: i as f32 * 8.0,
        });
        pump(&frames, &popup, 1);
    }
    popup.pan_ended(80.0, 20.0);
    pump(&frames, &popup, 30);

    log::info!("--- upward drag, rubber-banded ---");
    popup.pan_began();
    popup.pan_changed(Vec2 { x: 0.0, y: -100.0 });
    pump(&frames, &popup, 5);
    popup.pan_ended(-100.0, -40.0);
    pump(&frames, &popup, 30);

    log::info!("--- flick to dismiss ---");
    popup.pan_began();
    popup.pan_changed(Vec2 { x: 0.0, y: 60.0 });
    popup.pan_ended(60.0, 800.0);
    pump(&frames, &popup, 30);
    // The fall has force-dismissed by now; ride the outro out.
    popup.close(|| log::info!("completion: popup fully gone"));

    let mut budget = 300;
    while !popup.is_disposed() && budget > 0 {
        pump(&frames, &popup, 5);
        budget -= 5;
    }
    log::info!("done; frame subscribers left: {}", frames.subscriber_count());
    Ok(())
}
