pub const PHASE_COUNT: usize = 11;

/// One step of the scripted swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Address,
    InitialTakeAway,
    TakeAway,
    FullRotation,
    TopOfSwing,
    InitialDownswing,
    Release,
    Impact,
    FollowThrough,
    Finish,
}

/// Which way a tracked axis' actual position must cross its setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// `actual <= setpoint`
    Falling,
    /// `actual >= setpoint`
    Rising,
}

impl Crossing {
    pub fn reached(&self, actual: i32, setpoint: i32) -> bool {
        match self {
            Crossing::Falling => actual <= setpoint,
            Crossing::Rising => actual >= setpoint,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Wait for the operator's start trigger.
    OnStart,
    /// Both tracked axes report move completion.
    BothDone,
    /// Both tracked axes cross their live position setpoints.
    Threshold(Crossing),
}

/// Move target the tracked axes drive toward during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Address,
    TopOfSwing,
    Finish,
}

impl Phase {
    pub const ALL: [Phase; PHASE_COUNT] = [
        Phase::Idle,
        Phase::Address,
        Phase::InitialTakeAway,
        Phase::TakeAway,
        Phase::FullRotation,
        Phase::TopOfSwing,
        Phase::InitialDownswing,
        Phase::Release,
        Phase::Impact,
        Phase::FollowThrough,
        Phase::Finish,
    ];

    pub fn from_index(index: usize) -> Option<Phase> {
        Self::ALL.get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Address => "Address",
            Phase::InitialTakeAway => "Initial Take Away",
            Phase::TakeAway => "Take Away",
            Phase::FullRotation => "Full Rotation",
            Phase::TopOfSwing => "Top of Swing",
            Phase::InitialDownswing => "Initial Downswing",
            Phase::Release => "Release",
            Phase::Impact => "Impact",
            Phase::FollowThrough => "Follow Through",
            Phase::Finish => "Finish",
        }
    }

    pub fn advance(&self) -> Advance {
        match self {
            Phase::Idle => Advance::OnStart,
            Phase::Address | Phase::TopOfSwing | Phase::Finish => Advance::BothDone,
            Phase::InitialTakeAway | Phase::TakeAway | Phase::FullRotation => {
                Advance::Threshold(Crossing::Falling)
            }
            Phase::InitialDownswing | Phase::Release | Phase::Impact | Phase::FollowThrough => {
                Advance::Threshold(Crossing::Rising)
            }
        }
    }

    pub fn target(&self) -> TargetKind {
        match self {
            Phase::Idle | Phase::Address => TargetKind::Address,
            Phase::InitialTakeAway | Phase::TakeAway | Phase::FullRotation | Phase::TopOfSwing => {
                TargetKind::TopOfSwing
            }
            _ => TargetKind::Finish,
        }
    }
}
