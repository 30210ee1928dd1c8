//! Mouse gestures composed from single reports.
//!
//! A [`GesturePlayer`] borrows a controller and plays short sequences such as
//! click, drag or hover.  It remembers which buttons it is holding, so an
//! absolute move issued between `mouse_down` and `mouse_up` keeps the button
//! pressed instead of releasing it.
//!
//! The pauses between reports come from [`GestureTimings`].  Tests use
//! [`GestureTimings::immediate`] to skip every sleep.

use std::time::Duration;

use ch9329_core::{AbsoluteMouseReport, MouseButtons, RelativeMouseReport};
use tracing::debug;

use crate::application::controller::Ch9329Controller;
use crate::application::dispatcher::{CommandError, Transport};

/// Pauses used between the reports of a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTimings {
    /// Time a button stays down during a click.
    pub click_hold: Duration,
    /// Gap between the two clicks of a double click.
    pub double_click_gap: Duration,
    /// Pause after pressing and after moving in a relative drag.
    pub drag_hold: Duration,
    /// Pause after each step of an absolute drag.
    pub drag_step: Duration,
    /// Pause between an absolute move and the click that follows it.
    pub move_settle: Duration,
    /// How long a hover lasts.
    pub hover: Duration,
    /// Time allowed for a context menu to open.
    pub menu_open: Duration,
}

impl Default for GestureTimings {
    fn default() -> Self {
        Self {
            click_hold: Duration::from_millis(50),
            double_click_gap: Duration::from_millis(150),
            drag_hold: Duration::from_millis(100),
            drag_step: Duration::from_millis(50),
            move_settle: Duration::from_millis(10),
            hover: Duration::from_millis(1000),
            menu_open: Duration::from_millis(500),
        }
    }
}

impl GestureTimings {
    /// All pauses set to zero.
    pub fn immediate() -> Self {
        Self {
            click_hold: Duration::ZERO,
            double_click_gap: Duration::ZERO,
            drag_hold: Duration::ZERO,
            drag_step: Duration::ZERO,
            move_settle: Duration::ZERO,
            hover: Duration::ZERO,
            menu_open: Duration::ZERO,
        }
    }
}

/// Plays gestures on a borrowed controller.
pub struct GesturePlayer<'a, T: Transport> {
    controller: &'a mut Ch9329Controller<T>,
    timings: GestureTimings,
    held: MouseButtons,
}

impl<'a, T: Transport> GesturePlayer<'a, T> {
    pub fn new(controller: &'a mut Ch9329Controller<T>) -> Self {
        Self::with_timings(controller, GestureTimings::default())
    }

    pub fn with_timings(controller: &'a mut Ch9329Controller<T>, timings: GestureTimings) -> Self {
        Self {
            controller,
            timings,
            held: MouseButtons::NONE,
        }
    }

    /// Buttons currently held by this player.
    pub fn held(&self) -> MouseButtons {
        self.held
    }

    // ── Buttons ───────────────────────────────────────────────────────────────

    /// Presses `button`.  The held state only changes once the chip accepts it.
    pub fn mouse_down(&mut self, button: MouseButtons) -> Result<(), CommandError> {
        let pressed = MouseButtons(self.held.0 | button.0);
        self.send_relative(pressed, 0, 0, 0)?;
        self.held = pressed;
        Ok(())
    }

    /// Releases every held button.
    pub fn mouse_up(&mut self) -> Result<(), CommandError> {
        self.send_relative(MouseButtons::NONE, 0, 0, 0)?;
        self.held = MouseButtons::NONE;
        Ok(())
    }

    pub fn click(&mut self, button: MouseButtons) -> Result<(), CommandError> {
        debug!("click buttons=0x{:02X}", button.0);
        self.mouse_down(button)?;
        pause(self.timings.click_hold);
        self.mouse_up()
    }

    pub fn double_click(&mut self, button: MouseButtons) -> Result<(), CommandError> {
        self.click(button)?;
        pause(self.timings.double_click_gap);
        self.click(button)
    }

    /// Right click, then wait for the menu to appear.
    pub fn right_click_menu(&mut self) -> Result<(), CommandError> {
        self.click(MouseButtons::RIGHT_ONLY)?;
        pause(self.timings.menu_open);
        Ok(())
    }

    // ── Relative motion ───────────────────────────────────────────────────────

    pub fn move_by(&mut self, dx: i8, dy: i8) -> Result<(), CommandError> {
        self.relative(dx, dy, 0)
    }

    /// Positive `delta` scrolls up.
    pub fn scroll(&mut self, delta: i8) -> Result<(), CommandError> {
        self.relative(0, 0, delta)
    }

    /// Press, move by `(dx, dy)` with the button held, release.
    pub fn drag(&mut self, button: MouseButtons, dx: i8, dy: i8) -> Result<(), CommandError> {
        self.mouse_down(button)?;
        pause(self.timings.drag_hold);
        self.move_by(dx, dy)?;
        pause(self.timings.drag_hold);
        self.mouse_up()
    }

    /// Zero-motion report, then hold still for the hover duration.
    pub fn hover(&mut self) -> Result<(), CommandError> {
        self.relative(0, 0, 0)?;
        pause(self.timings.hover);
        Ok(())
    }

    // ── Absolute motion ───────────────────────────────────────────────────────

    /// Moves to `(x, y)` in device space; values above 4095 are clamped.
    pub fn move_to(&mut self, x: u16, y: u16) -> Result<(), CommandError> {
        self.controller.send_mouse_absolute(&AbsoluteMouseReport {
            buttons: self.held,
            x,
            y,
            wheel: 0,
        })
    }

    pub fn click_at(&mut self, x: u16, y: u16, button: MouseButtons) -> Result<(), CommandError> {
        self.move_to(x, y)?;
        pause(self.timings.move_settle);
        self.click(button)
    }

    /// Move to `from`, press, move to `to`, release.
    pub fn drag_to(
        &mut self,
        from: (u16, u16),
        to: (u16, u16),
        button: MouseButtons,
    ) -> Result<(), CommandError> {
        self.move_to(from.0, from.1)?;
        pause(self.timings.drag_step);
        self.mouse_down(button)?;
        pause(self.timings.drag_step);
        self.move_to(to.0, to.1)?;
        pause(self.timings.drag_step);
        self.mouse_up()
    }

    /// Left-button drag from `from` to `to`, e.g. to select text.
    pub fn drag_select(&mut self, from: (u16, u16), to: (u16, u16)) -> Result<(), CommandError> {
        self.drag_to(from, to, MouseButtons::LEFT_ONLY)
    }

    fn relative(&mut self, dx: i8, dy: i8, wheel: i8) -> Result<(), CommandError> {
        self.send_relative(self.held, dx, dy, wheel)
    }

    fn send_relative(
        &mut self,
        buttons: MouseButtons,
        dx: i8,
        dy: i8,
        wheel: i8,
    ) -> Result<(), CommandError> {
        self.controller.send_mouse_relative(&RelativeMouseReport {
            buttons,
            dx,
            dy,
            wheel,
        })
    }
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::application::dispatcher::{CommandDispatcher, MockTransport};
    use ch9329_core::{build_frame, protocol::constants::DEVICE_ADDRESS};

    /// A mock that acks every frame and records what was written.
    fn acking_mock(log: Arc<Mutex<Vec<Vec<u8>>>>) -> MockTransport {
        let last_cmd = Arc::new(Mutex::new(0u8));
        let cmd_w = Arc::clone(&last_cmd);
        let mut mock = MockTransport::new();
        mock.expect_write_bytes().returning(move |frame| {
            *cmd_w.lock().unwrap() = frame[3];
            log.lock().unwrap().push(frame.to_vec());
            Ok(())
        });
        mock.expect_read_bytes().returning(move |buf| {
            let cmd = *last_cmd.lock().unwrap();
            let reply = build_frame(DEVICE_ADDRESS, cmd | 0x80, &[0x00]);
            buf[..reply.len()].copy_from_slice(&reply);
            Ok(reply.len())
        });
        mock
    }

    fn run<F>(gesture: F) -> Vec<Vec<u8>>
    where
        F: FnOnce(&mut GesturePlayer<'_, MockTransport>) -> Result<(), CommandError>,
    {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut ctl = Ch9329Controller::with_dispatcher(CommandDispatcher::with_settle_delay(
            acking_mock(Arc::clone(&log)),
            Duration::ZERO,
        ));
        let mut player = GesturePlayer::with_timings(&mut ctl, GestureTimings::immediate());
        gesture(&mut player).expect("gesture succeeds");
        let frames = log.lock().unwrap().clone();
        frames
    }

    /// Payload bytes of a written frame.
    fn payload(frame: &[u8]) -> &[u8] {
        &frame[5..frame.len() - 1]
    }

    #[test]
    fn test_click_sends_press_then_release() {
        // Act
        let frames = run(|p| p.click(MouseButtons::LEFT_ONLY));

        // Assert
        assert_eq!(frames.len(), 2);
        assert_eq!(payload(&frames[0]), &[0x01, 0x01, 0, 0, 0]);
        assert_eq!(payload(&frames[1]), &[0x01, 0x00, 0, 0, 0]);
    }

    #[test]
    fn test_double_click_sends_four_reports() {
        let frames = run(|p| p.double_click(MouseButtons::RIGHT_ONLY));

        assert_eq!(frames.len(), 4);
        assert_eq!(payload(&frames[2]), &[0x01, 0x02, 0, 0, 0]);
    }

    #[test]
    fn test_drag_keeps_button_held_while_moving() {
        let frames = run(|p| p.drag(MouseButtons::LEFT_ONLY, 10, -3));

        assert_eq!(frames.len(), 3);
        assert_eq!(payload(&frames[1]), &[0x01, 0x01, 10, (-3i8) as u8, 0]);
        assert_eq!(payload(&frames[2])[1], 0x00);
    }

    #[test]
    fn test_absolute_drag_holds_button_across_move() {
        // Act
        let frames = run(|p| p.drag_select((100, 100), (4000, 200)));

        // Assert: move, press, move with button, release
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0][3], 0x04);
        assert_eq!(payload(&frames[0])[1], 0x00);
        assert_eq!(frames[2][3], 0x04);
        assert_eq!(payload(&frames[2])[1], 0x01);
        assert_eq!(&payload(&frames[2])[2..6], &[0xA0, 0x0F, 0xC8, 0x00]);
        assert_eq!(frames[3][3], 0x05);
        assert_eq!(payload(&frames[3])[1], 0x00);
    }

    #[test]
    fn test_move_to_clamps_to_4095() {
        let frames = run(|p| p.move_to(5000, 9999));

        assert_eq!(&payload(&frames[0])[2..6], &[0xFF, 0x0F, 0xFF, 0x0F]);
    }

    #[test]
    fn test_scroll_puts_delta_in_wheel_byte() {
        let frames = run(|p| p.scroll(-2));

        assert_eq!(payload(&frames[0]), &[0x01, 0x00, 0, 0, 0xFE]);
    }

    #[test]
    fn test_hover_and_menu_send_expected_reports() {
        let hover = run(|p| p.hover());
        let menu = run(|p| p.right_click_menu());

        assert_eq!(hover.len(), 1);
        assert_eq!(payload(&hover[0]), &[0x01, 0x00, 0, 0, 0]);
        assert_eq!(menu.len(), 2);
        assert_eq!(payload(&menu[0])[1], 0x02);
    }

    #[test]
    fn test_rejected_press_does_not_leave_button_held() {
        // Arrange: the chip rejects the press, then accepts the move.
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_w = Arc::clone(&log);
        let replies = Arc::new(Mutex::new(vec![
            build_frame(DEVICE_ADDRESS, 0x84, &[0x00]),
            build_frame(DEVICE_ADDRESS, 0xC5, &[0xE5]),
        ]));
        let mut mock = MockTransport::new();
        mock.expect_write_bytes().returning(move |frame| {
            log_w.lock().unwrap().push(frame.to_vec());
            Ok(())
        });
        mock.expect_read_bytes().returning(move |buf| {
            let reply = replies.lock().unwrap().pop().unwrap_or_default();
            buf[..reply.len()].copy_from_slice(&reply);
            Ok(reply.len())
        });
        let mut ctl = Ch9329Controller::with_dispatcher(CommandDispatcher::with_settle_delay(
            mock,
            Duration::ZERO,
        ));
        let mut player = GesturePlayer::with_timings(&mut ctl, GestureTimings::immediate());

        // Act
        let press = player.mouse_down(MouseButtons::LEFT_ONLY);
        let moved = player.move_to(100, 100);

        // Assert
        assert!(matches!(press, Err(CommandError::DeviceStatus(_))));
        assert!(moved.is_ok());
        assert!(player.held().is_empty());
        assert_eq!(payload(&log.lock().unwrap()[1])[1], 0x00);
    }

    #[test]
    fn test_default_timings() {
        let t = GestureTimings::default();
        assert_eq!(t.click_hold, Duration::from_millis(50));
        assert_eq!(t.double_click_gap, Duration::from_millis(150));
        assert_eq!(t.hover, Duration::from_secs(1));
    }
}
