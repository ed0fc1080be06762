/// Entities taking part in MAC scheduling
#[derive(PartialEq, Eq, Hash, Clone, Debug, Copy)]
pub enum LteEntity {
    /// eNB MAC, the user of the scheduler. Submits reports and triggers, receives grants
    Mac,
    /// MAC scheduler
    Sched,
    /// Radio Resource Control, source of cell, UE and bearer configuration
    Rrc,
}
