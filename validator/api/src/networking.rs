pub mod destination_rule;
pub mod service_entry;
pub mod virtual_service;

pub use self::{
    destination_rule::{DestinationRule, DestinationRuleSpec},
    service_entry::{ServiceEntry, ServiceEntrySpec},
    virtual_service::{VirtualService, VirtualServiceSpec},
};
