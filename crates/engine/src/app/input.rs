use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    TogglePause,
}

const ACTION_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::TogglePause => 4,
        }
    }
}

/// Input consumed by one simulation frame. Pause is a level, not an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    quit_requested: bool,
    paused: bool,
    actions: ActionStates,
    pointer_delta: Vec2,
    zoom_delta_steps: i32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_delta
    }

    pub fn zoom_delta_steps(&self) -> i32 {
        self.zoom_delta_steps
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    pub fn with_pointer_delta(mut self, pointer_delta: Vec2) -> Self {
        self.pointer_delta = pointer_delta;
        self
    }

    pub fn with_zoom_delta_steps(mut self, zoom_delta_steps: i32) -> Self {
        self.zoom_delta_steps = zoom_delta_steps;
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }
}

/// Accumulates raw host input between frames.
#[derive(Debug, Default)]
pub struct InputCollector {
    quit_requested: bool,
    paused: bool,
    action_states: ActionStates,
    pending_pointer_delta: Vec2,
    pending_zoom_steps: i32,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    /// Records a key state change. The pause key flips the paused level on
    /// its press edge only.
    pub fn set_action(&mut self, action: InputAction, is_down: bool) {
        if action == InputAction::TogglePause && is_down && !self.action_states.is_down(action) {
            self.paused = !self.paused;
        }
        self.action_states.set(action, is_down);
    }

    pub fn add_pointer_delta(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pending_pointer_delta += delta;
        }
    }

    pub fn add_zoom_steps(&mut self, steps: i32) {
        self.pending_zoom_steps = self.pending_zoom_steps.saturating_add(steps);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot {
            quit_requested: self.quit_requested,
            paused: self.paused,
            actions: self.action_states,
            pointer_delta: self.pending_pointer_delta,
            zoom_delta_steps: self.pending_zoom_steps,
        };
        self.pending_pointer_delta = Vec2::ZERO;
        self.pending_zoom_steps = 0;
        snapshot
    }
}
