use std::sync::Arc;
use tokio::sync::Mutex;

/// Logical Printful endpoint families. Each family has its own base address
/// and its own request budget upstream, so each gets its own gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Products,
    Store,
    MockupGenerator,
    Countries,
    Orders,
    Shipping,
    Tax,
}

impl Endpoint {
    pub const ALL: [Endpoint; 7] = [
        Endpoint::Products,
        Endpoint::Store,
        Endpoint::MockupGenerator,
        Endpoint::Countries,
        Endpoint::Orders,
        Endpoint::Shipping,
        Endpoint::Tax,
    ];

    pub fn base_url(self) -> &'static str {
        match self {
            Endpoint::Products => "https://api.printful.com/products",
            Endpoint::Store => "https://api.printful.com/store",
            Endpoint::MockupGenerator => "https://api.printful.com/mockup-generator",
            Endpoint::Countries => "https://api.printful.com/countries",
            Endpoint::Orders => "https://api.printful.com/orders",
            Endpoint::Shipping => "https://api.printful.com/shipping",
            Endpoint::Tax => "https://api.printful.com/tax",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Products => "products",
            Endpoint::Store => "store",
            Endpoint::MockupGenerator => "mockup-generator",
            Endpoint::Countries => "countries",
            Endpoint::Orders => "orders",
            Endpoint::Shipping => "shipping",
            Endpoint::Tax => "tax",
        }
    }
}

/// Serialization gate: single-flight access to one endpoint family.
pub type Gate = Arc<Mutex<()>>;

/// One gate per endpoint, created before any traffic flows.
///
/// Constructed once at startup and injected into the dispatcher; the same
/// endpoint always maps to the same gate, and no two endpoints share one, so
/// calls to different endpoints never block each other.
pub struct EndpointRegistry {
    gates: [Gate; 7],
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self {
            gates: std::array::from_fn(|_| Arc::new(Mutex::new(()))),
        }
    }

    pub fn gate_for(&self, endpoint: Endpoint) -> Gate {
        self.gates[endpoint as usize].clone()
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}
