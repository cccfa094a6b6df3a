//! Entrance-animation timing.
//!
//! Page sections fade in one after another.  Section `index` starts
//! `gap * index - gap / 2` seconds after load (never negative), so with the
//! usual `gap = 0.1` the avatar appears first, the subtitle 50 ms later, and
//! so on.  When the document disables transitions no motion is produced at
//! all and the front end renders sections statically.

use serde::Serialize;

/// Direction a section slides in from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionDirection {
    /// Slides down from above (y = -100).
    #[default]
    ToBottom,
    /// Rises from slightly below (y = 30).
    ToTop,
}

/// One keyframe: opacity plus vertical offset in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frame {
    pub opacity: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Variants {
    pub initial: Frame,
    pub animate: Frame,
    pub exit: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    /// Seconds.
    pub duration: f64,
    /// Seconds.
    pub delay: f64,
}

/// A complete motion description, shaped the way animation libraries expect
/// it: state labels, the keyframes for each state, and the transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Motion {
    pub initial: &'static str,
    pub animate: &'static str,
    pub exit: &'static str,
    pub variants: Variants,
    pub transition: Transition,
}

impl MotionDirection {
    fn variants(self) -> Variants {
        let offset = match self {
            MotionDirection::ToBottom => -100.0,
            MotionDirection::ToTop => 30.0,
        };
        Variants {
            initial: Frame { opacity: 0.0, y: offset },
            animate: Frame { opacity: 1.0, y: 0.0 },
            exit: Frame { opacity: 0.0, y: offset },
        }
    }
}

/// Computes the motion for the section at position `index`.
///
/// Returns `None` when `animate` is `false`.
pub fn motion(
    gap: f64,
    index: u32,
    duration: f64,
    animate: bool,
    direction: MotionDirection,
) -> Option<Motion> {
    if !animate {
        return None;
    }

    let delay = (gap * f64::from(index) - gap / 2.0).max(0.0);

    Some(Motion {
        initial: "initial",
        animate: "animate",
        exit: "exit",
        variants: direction.variants(),
        transition: Transition { duration, delay },
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
