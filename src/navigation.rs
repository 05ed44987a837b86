//! Slice navigation driven by discrete input events.
//!
//! [`SliceNavigationController`] keeps the index of the slice currently on
//! screen and moves it one step at a time in response to mouse wheel and
//! Up/Down key events. Moving past either end of the stack is absorbed
//! silently. Every accepted move renders the new slice through an
//! [`ImageStackProvider`] and updates a [`StatusSink`] overlay.
//!
//! ```
//! # use dicom_slicer::navigation::{ImageStackProvider, InputEvent, SliceNavigationController, StatusSink};
//! # struct Stack;
//! # impl ImageStackProvider for Stack {
//! #     fn slice_count(&self) -> usize { 10 }
//! #     fn render_slice_at(&mut self, _index: usize) {}
//! # }
//! # struct Overlay;
//! # impl StatusSink for Overlay {
//! #     fn set_status_text(&mut self, _text: &str) {}
//! #     fn refresh(&mut self) {}
//! # }
//! let mut controller = SliceNavigationController::from_provider(Stack, Overlay)
//!     .expect("stack is not empty");
//! controller.handle_input(InputEvent::WheelUp);
//! controller.handle_input(InputEvent::KeyUp);
//! assert_eq!(controller.slice_index(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Invalid slice range: min {min} is greater than max {max}")]
    InvalidRange { min: usize, max: usize },

    #[error("Image stack has no slices")]
    EmptyStack,
}

/// Source of the slices being navigated.
pub trait ImageStackProvider {
    fn slice_count(&self) -> usize;

    /// Display the slice at `index`. Only called with in-range indices.
    fn render_slice_at(&mut self, index: usize);
}

/// On-screen text overlay showing the slice status.
pub trait StatusSink {
    fn set_status_text(&mut self, text: &str);

    /// Redraw the overlay. Idempotent.
    fn refresh(&mut self);
}

impl<T: ImageStackProvider + ?Sized> ImageStackProvider for &mut T {
    fn slice_count(&self) -> usize {
        (**self).slice_count()
    }

    fn render_slice_at(&mut self, index: usize) {
        (**self).render_slice_at(index)
    }
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn set_status_text(&mut self, text: &str) {
        (**self).set_status_text(text)
    }

    fn refresh(&mut self) {
        (**self).refresh()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    StepForward,
    StepBackward,
}

/// Raw input delivered by the host event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    WheelUp,
    WheelDown,
    KeyUp,
    KeyDown,
}

impl InputEvent {
    /// Map a key symbol as reported by a windowing system. Only the arrow
    /// keys navigate; everything else yields `None`.
    pub fn from_key_sym(key: &str) -> Option<Self> {
        match key {
            "Up" => Some(Self::KeyUp),
            "Down" => Some(Self::KeyDown),
            _ => None,
        }
    }
}

impl From<InputEvent> for NavigationEvent {
    fn from(event: InputEvent) -> Self {
        match event {
            InputEvent::WheelUp | InputEvent::KeyUp => NavigationEvent::StepForward,
            InputEvent::WheelDown | InputEvent::KeyDown => NavigationEvent::StepBackward,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown input event: {0:?}")]
pub struct ParseInputEventError(String);

impl FromStr for InputEvent {
    type Err = ParseInputEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wheel-up" | "wheelup" | "wheel-forward" => Ok(Self::WheelUp),
            "wheel-down" | "wheeldown" | "wheel-backward" => Ok(Self::WheelDown),
            "up" | "key-up" => Ok(Self::KeyUp),
            "down" | "key-down" => Ok(Self::KeyDown),
            _ => Err(ParseInputEventError(s.to_owned())),
        }
    }
}

/// Status line shown next to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    pub slice: usize,
    pub max_slice: usize,
}

impl StatusMessage {
    pub fn format(slice: usize, max_slice: usize) -> String {
        Self { slice, max_slice }.to_string()
    }
}

impl fmt::Display for StatusMessage {
    // Progress through the stack as a fraction, e.g. "Slice Number 0.1".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = (self.slice + 1) as f64 / (self.max_slice + 1) as f64;
        write!(f, "Slice Number {}", shortest_repr(progress))
    }
}

/// Shortest round-trip form with a signed, two-digit exponent ("1e-05").
fn shortest_repr(value: f64) -> String {
    let repr = format!("{value:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceState {
    AtLowerBound,
    InRange,
    AtUpperBound,
}

pub struct SliceNavigationController<P, S> {
    provider: P,
    sink: S,
    slice_index: usize,
    min_slice: usize,
    max_slice: usize,
}

impl<P: ImageStackProvider, S: StatusSink> SliceNavigationController<P, S> {
    /// Create a controller over the closed range `[min_slice, max_slice]`,
    /// starting at `min_slice`.
    pub fn new(
        provider: P,
        sink: S,
        min_slice: usize,
        max_slice: usize,
    ) -> Result<Self, NavigationError> {
        if min_slice > max_slice {
            return Err(NavigationError::InvalidRange {
                min: min_slice,
                max: max_slice,
            });
        }
        debug!("Slicer: Min = {}, Max = {}", min_slice, max_slice);
        Ok(Self {
            provider,
            sink,
            slice_index: min_slice,
            min_slice,
            max_slice,
        })
    }

    /// Create a controller covering every slice of `provider`.
    pub fn from_provider(provider: P, sink: S) -> Result<Self, NavigationError> {
        let max_slice = provider
            .slice_count()
            .checked_sub(1)
            .ok_or(NavigationError::EmptyStack)?;
        Self::new(provider, sink, 0, max_slice)
    }

    pub fn slice_index(&self) -> usize {
        self.slice_index
    }

    pub fn min_slice(&self) -> usize {
        self.min_slice
    }

    pub fn max_slice(&self) -> usize {
        self.max_slice
    }

    pub fn state(&self) -> SliceState {
        if self.slice_index == self.min_slice {
            SliceState::AtLowerBound
        } else if self.slice_index == self.max_slice {
            SliceState::AtUpperBound
        } else {
            SliceState::InRange
        }
    }

    pub fn status_message(&self) -> String {
        StatusMessage::format(self.slice_index, self.max_slice)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (P, S) {
        (self.provider, self.sink)
    }

    /// Move to the next slice. Returns `false` if already at the last one.
    pub fn step_forward(&mut self) -> bool {
        if self.slice_index >= self.max_slice {
            return false;
        }
        self.slice_index += 1;
        debug!("MoveSliceForward :: Slice = {}", self.slice_index);
        self.show_current();
        true
    }

    /// Move to the previous slice. Returns `false` if already at the first one.
    pub fn step_backward(&mut self) -> bool {
        if self.slice_index <= self.min_slice {
            return false;
        }
        self.slice_index -= 1;
        debug!("MoveSliceBackward :: Slice = {}", self.slice_index);
        self.show_current();
        true
    }

    pub fn handle(&mut self, event: NavigationEvent) -> bool {
        match event {
            NavigationEvent::StepForward => self.step_forward(),
            NavigationEvent::StepBackward => self.step_backward(),
        }
    }

    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        self.handle(event.into())
    }

    /// Render the current slice and push its status, regardless of bounds.
    pub fn show_current(&mut self) {
        self.provider.render_slice_at(self.slice_index);
        let message = self.status_message();
        self.sink.set_status_text(&message);
        self.sink.refresh();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Render(usize),
        Text(String),
        Refresh,
    }

    #[derive(Default)]
    struct Recorder {
        slices: usize,
        calls: Vec<Call>,
    }

    impl Recorder {
        fn with_slices(slices: usize) -> Self {
            Self {
                slices,
                ..Default::default()
            }
        }

        fn rendered(&self) -> Vec<usize> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Render(index) => Some(*index),
                    _ => None,
                })
                .collect()
        }
    }

    impl ImageStackProvider for Recorder {
        fn slice_count(&self) -> usize {
            self.slices
        }

        fn render_slice_at(&mut self, index: usize) {
            self.calls.push(Call::Render(index));
        }
    }

    impl StatusSink for Recorder {
        fn set_status_text(&mut self, text: &str) {
            self.calls.push(Call::Text(text.to_owned()));
        }

        fn refresh(&mut self) {
            self.calls.push(Call::Refresh);
        }
    }

    fn controller(min: usize, max: usize) -> SliceNavigationController<Recorder, Recorder> {
        SliceNavigationController::new(Recorder::default(), Recorder::default(), min, max)
            .unwrap()
    }

    #[test]
    fn starts_at_min_slice() {
        for (min, max) in [(0, 0), (0, 9), (3, 7), (5, 5)] {
            let controller = controller(min, max);
            assert_eq!(controller.slice_index(), min);
            assert!(controller.provider().calls.is_empty());
            assert!(controller.sink().calls.is_empty());
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let result =
            SliceNavigationController::new(Recorder::default(), Recorder::default(), 5, 2);
        assert_eq!(
            result.err(),
            Some(NavigationError::InvalidRange { min: 5, max: 2 })
        );
    }

    #[test]
    fn empty_provider_is_rejected() {
        let result = SliceNavigationController::from_provider(
            Recorder::with_slices(0),
            Recorder::default(),
        );
        assert_eq!(result.err(), Some(NavigationError::EmptyStack));
    }

    #[test]
    fn from_provider_spans_every_slice() {
        let controller = SliceNavigationController::from_provider(
            Recorder::with_slices(12),
            Recorder::default(),
        )
        .unwrap();
        assert_eq!(controller.min_slice(), 0);
        assert_eq!(controller.max_slice(), 11);
    }

    #[test]
    fn forward_and_backward_render_in_order() {
        let mut controller = controller(0, 9);
        for _ in 0..3 {
            assert!(controller.step_forward());
        }
        assert!(controller.step_backward());

        assert_eq!(controller.slice_index(), 2);
        assert_eq!(controller.provider().rendered(), vec![1, 2, 3, 2]);
    }

    #[test]
    fn accepted_step_updates_status_then_refreshes() {
        let mut controller = controller(0, 9);
        controller.step_forward();
        assert_eq!(
            controller.sink().calls,
            vec![Call::Text("Slice Number 0.2".to_owned()), Call::Refresh]
        );
    }

    #[test]
    fn forward_at_upper_bound_is_silent() {
        let mut controller = controller(0, 2);
        controller.step_forward();
        controller.step_forward();
        assert_eq!(controller.state(), SliceState::AtUpperBound);

        let (rendered, texts) = (
            controller.provider().calls.len(),
            controller.sink().calls.len(),
        );
        assert!(!controller.step_forward());
        assert_eq!(controller.slice_index(), 2);
        assert_eq!(controller.provider().calls.len(), rendered);
        assert_eq!(controller.sink().calls.len(), texts);
    }

    #[test]
    fn backward_at_lower_bound_is_idempotent() {
        let mut controller = controller(4, 8);
        for _ in 0..5 {
            assert!(!controller.step_backward());
        }
        assert_eq!(controller.slice_index(), 4);
        assert_eq!(controller.state(), SliceState::AtLowerBound);
        assert!(controller.provider().calls.is_empty());
        assert!(controller.sink().calls.is_empty());
    }

    #[test]
    fn index_never_leaves_range() {
        let mut controller = controller(2, 6);
        // deterministic mix of steps, biased toward each end in turn
        let pattern = [1u8, 1, 1, 1, 1, 1, 1, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0];
        for (round, &bit) in pattern.iter().cycle().take(200).enumerate() {
            let before = controller.slice_index();
            let forward = (bit == 1) ^ (round / 40 % 2 == 1);
            let accepted = if forward {
                controller.step_forward()
            } else {
                controller.step_backward()
            };
            let after = controller.slice_index();
            assert!((2..=6).contains(&after));
            match (accepted, forward) {
                (true, true) => assert_eq!(after, before + 1),
                (true, false) => assert_eq!(after + 1, before),
                (false, _) => assert_eq!(after, before),
            }
        }
    }

    #[test]
    fn single_slice_range_absorbs_everything() {
        let mut controller = controller(3, 3);
        assert!(!controller.step_forward());
        assert!(!controller.step_backward());
        assert_eq!(controller.slice_index(), 3);
    }

    #[test]
    fn state_tracks_position() {
        let mut controller = controller(0, 2);
        assert_eq!(controller.state(), SliceState::AtLowerBound);
        controller.step_forward();
        assert_eq!(controller.state(), SliceState::InRange);
        controller.step_forward();
        assert_eq!(controller.state(), SliceState::AtUpperBound);
    }

    #[test]
    fn input_events_map_to_steps() {
        assert_eq!(
            NavigationEvent::from(InputEvent::WheelUp),
            NavigationEvent::StepForward
        );
        assert_eq!(
            NavigationEvent::from(InputEvent::KeyUp),
            NavigationEvent::StepForward
        );
        assert_eq!(
            NavigationEvent::from(InputEvent::WheelDown),
            NavigationEvent::StepBackward
        );
        assert_eq!(
            NavigationEvent::from(InputEvent::KeyDown),
            NavigationEvent::StepBackward
        );
    }

    #[test]
    fn key_and_wheel_events_drive_the_controller() {
        let mut controller = controller(0, 4);
        controller.handle_input(InputEvent::WheelUp);
        controller.handle_input(InputEvent::KeyUp);
        controller.handle_input(InputEvent::KeyDown);
        controller.handle_input(InputEvent::WheelUp);
        assert_eq!(controller.provider().rendered(), vec![1, 2, 1, 2]);
    }

    #[test]
    fn key_syms_other_than_arrows_are_ignored() {
        assert_eq!(InputEvent::from_key_sym("Up"), Some(InputEvent::KeyUp));
        assert_eq!(InputEvent::from_key_sym("Down"), Some(InputEvent::KeyDown));
        assert_eq!(InputEvent::from_key_sym("Left"), None);
        assert_eq!(InputEvent::from_key_sym("q"), None);
    }

    #[test]
    fn input_events_parse_from_tokens() {
        assert_eq!("wheel-up".parse(), Ok(InputEvent::WheelUp));
        assert_eq!(" Wheel-Down ".parse(), Ok(InputEvent::WheelDown));
        assert_eq!("UP".parse(), Ok(InputEvent::KeyUp));
        assert_eq!("down".parse(), Ok(InputEvent::KeyDown));
        assert!("sideways".parse::<InputEvent>().is_err());
    }

    #[test]
    fn status_message_is_fractional_progress() {
        assert_eq!(StatusMessage::format(0, 9), "Slice Number 0.1");
        assert_eq!(StatusMessage::format(9, 9), "Slice Number 1.0");
        assert_eq!(StatusMessage::format(0, 0), "Slice Number 1.0");
        assert_eq!(StatusMessage::format(1, 3), "Slice Number 0.5");
    }

    #[test]
    fn status_message_pads_small_exponents() {
        assert_eq!(StatusMessage::format(9_999, 99_999), "Slice Number 0.1");
        assert_eq!(StatusMessage::format(0, 99_999), "Slice Number 1e-05");
        assert_eq!(StatusMessage::format(2, 199_999), "Slice Number 1.5e-05");
        assert_eq!(shortest_repr(1e16), "1e+16");
        assert_eq!(shortest_repr(1e-120), "1e-120");
    }

    #[test]
    fn show_current_draws_without_moving() {
        let mut controller = controller(0, 9);
        controller.show_current();
        assert_eq!(controller.slice_index(), 0);
        assert_eq!(controller.provider().rendered(), vec![0]);
        assert_eq!(
            controller.sink().calls,
            vec![Call::Text("Slice Number 0.1".to_owned()), Call::Refresh]
        );
    }

    #[test]
    fn borrowed_collaborators_are_accepted() {
        let mut stack = Recorder::with_slices(3);
        let mut overlay = Recorder::default();
        {
            let mut controller =
                SliceNavigationController::from_provider(&mut stack, &mut overlay).unwrap();
            controller.step_forward();
        }
        assert_eq!(stack.rendered(), vec![1]);
        assert_eq!(overlay.calls.len(), 2);
    }
}
