use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

pub const REVERT_AFTER: Duration = Duration::from_millis(3000);

pub const GREETINGS: [&str; 13] = [
    "Hello!",
    "Hi there!",
    "Hey!",
    "Nice to see you!",
    "Great to have you here!",
    "I see you",
    "Looking good!",
    "There you are!",
    "Howdy!",
    "Happy to see a face!",
    "Hi, friend!",
    "Face detected!",
    "Hello, human!",
];

/// Picks an index in `0..len`. `len` is never zero.
pub trait PhraseChooser {
    fn choose(&mut self, len: usize) -> usize;
}

impl<F> PhraseChooser for F
where
    F: FnMut(usize) -> usize,
{
    fn choose(&mut self, len: usize) -> usize {
        self(len)
    }
}

#[derive(Debug, Clone)]
pub struct RandomPhrases(SmallRng);

impl RandomPhrases {
    pub fn from_os_rng() -> Self {
        Self(SmallRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

impl PhraseChooser for RandomPhrases {
    fn choose(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

/// Single-slot timer registry. Arming invalidates whatever was armed before,
/// so a late firing of an old handle is recognisable and ignored.
#[derive(Debug, Default)]
pub struct RevertTimer {
    armed: Option<TimerHandle>,
    next_id: u64,
}

impl RevertTimer {
    pub fn arm(&mut self) -> TimerHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = TimerHandle(self.next_id);
        self.armed = Some(handle);
        handle
    }

    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.armed.take()
    }

    pub fn is_armed(&self, handle: TimerHandle) -> bool {
        self.armed == Some(handle)
    }

    fn take_if_armed(&mut self, handle: TimerHandle) -> bool {
        if self.is_armed(handle) {
            self.armed = None;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresenceState {
    #[default]
    Idle,
    Active {
        greeting: &'static str,
    },
}

impl PresenceState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

#[derive(Debug, Default)]
pub struct PresenceMachine {
    state: PresenceState,
    timer: RevertTimer,
}

impl PresenceMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Enters (or stays in) `Active` and re-arms the revert timer. The
    /// returned handle must be scheduled to fire after [`REVERT_AFTER`].
    pub fn on_detection(&mut self, chooser: &mut dyn PhraseChooser) -> TimerHandle {
        if let Some(stale) = self.timer.cancel() {
            tracing::trace!(?stale, "revert timer cancelled by new detection");
        }

        if self.state == PresenceState::Idle {
            let index = chooser.choose(GREETINGS.len()).min(GREETINGS.len() - 1);
            self.state = PresenceState::Active {
                greeting: GREETINGS[index],
            };
        }

        self.timer.arm()
    }

    /// Returns `true` when the firing handle was current and the machine
    /// reverted to `Idle`.
    pub fn on_timer(&mut self, handle: TimerHandle) -> bool {
        if !self.timer.take_if_armed(handle) {
            tracing::debug!(?handle, "ignoring stale revert timer");
            return false;
        }

        self.state = PresenceState::Idle;
        true
    }
}
