mod compliance;
mod context;
mod contract;
mod negotiation;
mod rfq;
mod savings;
mod vendor;

pub use compliance::{ComplianceCheck, ComplianceChecker, ComplianceReport};
pub use context::{AgentContext, WeightSettings};
pub use contract::{ContractAnalyzer, ContractReport};
pub use negotiation::{NegotiationAdvisor, NegotiationReport, NegotiationRequest, Posture};
pub use rfq::{Criterion, Proposal, ProposalScore, RfqEvaluator, RfqReport, RfqRequest};
pub use savings::{SavingsRecord, SavingsReport, SavingsRequest, SavingsTracker};
pub use vendor::{VendorReport, VendorRequest, VendorRiskAgent};
