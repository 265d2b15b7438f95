//! Broker object names derived from an instance name.

/// The three broker objects one client talks to.
///
/// A pure function of the instance name: two clients built with the same
/// instance name address the same exchange and reply queue. Computed once per
/// client and never changed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Topology {
    output_exchange: String,
    input_queue: String,
    routing_key: String,
}

impl Topology {
    pub fn resolve(instance_name: &str) -> Self {
        // ---
        Self {
            output_exchange: format!("{instance_name}_ex"),
            input_queue: format!("{instance_name}_i"),
            routing_key: format!("{instance_name}_o"),
        }
    }

    /// Exchange requests are published to.
    pub fn output_exchange(&self) -> &str {
        &self.output_exchange
    }

    /// Queue replies are consumed from.
    pub fn input_queue(&self) -> &str {
        &self.input_queue
    }

    /// Routing key attached to every published request.
    pub fn routing_key(&self) -> &str {
        &self.routing_key
    }
}
