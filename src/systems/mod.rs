pub mod sdk;
pub mod fictitious_play;
