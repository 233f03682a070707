/// Bulk association, update and removal of entity tax bindings
pub mod association;
/// Best-effort batch outcomes shared by the bulk services
pub mod bulk;
/// Which entity types each tax type may be bound to
pub mod compatibility;
/// Entity existence lookups behind a pluggable trait
pub mod lookup;
/// Rule selection for an order line and persistence of its tax lines
pub mod pricing;
/// Ordered, compounding tax computation
pub mod resolver;
/// Tax rule store operations
pub mod tax;
