//! Graph data model and provider-normalized records

pub mod graph;
pub mod paper;
pub mod researcher;
pub mod source;

pub use graph::{CitationEdge, CollaborationEdge, Edge, EdgeKind, Graph, Node};
pub use paper::{AuthorRef, PaperNode, SupportingPaper, WorkSummary};
pub use researcher::{AuthorDetail, AuthorSummary, NodeRole, ResearcherNode, ResearcherSummary};
pub use source::SourceTag;
