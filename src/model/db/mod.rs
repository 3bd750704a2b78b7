pub mod ballot;
pub mod candidate;
pub mod election;
pub mod partylist;
pub mod position;
pub mod voter;
