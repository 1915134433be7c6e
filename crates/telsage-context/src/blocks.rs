// SPDX-FileCopyrightText: 2026 Telsage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static guidance table, one block per category.

use telsage_core::QueryCategory;

/// Persona placed at the top of every prompt.
pub const BASE_CONTEXT: &str = "You are an expert in telecommunications standards, with deep \
knowledge of 3GPP specifications for 5G and 4G systems: the 5G Core (5GC), the Evolved \
Packet Core (EPC), NG-RAN and E-UTRAN, their protocols, interfaces and procedures. Answer \
precisely, cite the relevant 3GPP technical specifications (TS/TR numbers and clauses) and \
state when behavior differs between releases.";

/// Used when the primary category has no block (`General`).
pub const GENERIC_GUIDANCE: &str =
    "Provide a clear, technical response with relevant 3GPP specification references.";

/// Category-specific answering guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryBlock {
    pub heading: &'static str,
    pub guidance: &'static [&'static str],
}

macro_rules! block {
    ($heading:literal, [$($line:literal),+ $(,)?]) => {
        Some(CategoryBlock {
            heading: $heading,
            guidance: &[$($line),+],
        })
    };
}

/// Guidance block for `category`; `None` for `General`.
pub fn block_for(category: QueryCategory) -> Option<CategoryBlock> {
    use QueryCategory::*;

    match category {
        Procedure => block!("For procedure-related queries:", [
            "Provide a clear step-by-step breakdown",
            "Include sequence diagrams if relevant",
            "List all involved network elements",
            "Detail message flows and parameters",
            "Specify preconditions and postconditions",
            "Highlight potential error scenarios",
            "Reference relevant 3GPP specifications (TS documents)",
        ]),
        Architecture => block!("For architecture-related queries:", [
            "Describe overall architecture structure",
            "Detail component roles and responsibilities",
            "Explain interfaces and reference points",
            "Discuss deployment considerations",
            "Include scalability aspects",
            "Mention virtualization options",
            "Reference relevant 3GPP specifications",
        ]),
        Protocol => block!("For protocol-related queries:", [
            "Explain protocol stack placement",
            "Detail message formats and fields",
            "Describe state machines",
            "List supported procedures",
            "Include protocol parameters",
            "Discuss protocol extensions",
            "Reference relevant 3GPP specifications",
        ]),
        Interface => block!("For interface-related queries:", [
            "Define connected network elements",
            "List supported protocols",
            "Detail interface requirements",
            "Explain message flows",
            "Describe interface configuration",
            "Include performance aspects",
            "Reference relevant 3GPP specifications",
        ]),
        Security => block!("For security-related queries:", [
            "Explain security mechanisms",
            "Detail key management",
            "Describe authentication flows",
            "List security features",
            "Include threat mitigations",
            "Discuss privacy aspects",
            "Reference relevant 3GPP specifications",
        ]),
        Performance => block!("For performance-related queries:", [
            "List key performance indicators",
            "Provide measurement methods",
            "Include benchmark data",
            "Detail optimization options",
            "Discuss scaling factors",
            "Explain monitoring approaches",
            "Reference relevant 3GPP specifications",
        ]),
        Qos => block!("For QoS-related queries:", [
            "Define QoS parameters",
            "Explain QoS flows",
            "Detail QoS handling",
            "List QoS classes",
            "Include mapping rules",
            "Discuss enforcement methods",
            "Reference relevant 3GPP specifications",
        ]),
        Reliability => block!("For reliability-related queries:", [
            "Explain redundancy mechanisms",
            "Detail failover procedures",
            "Describe recovery methods",
            "List availability features",
            "Include monitoring aspects",
            "Discuss SLA considerations",
            "Reference relevant 3GPP specifications",
        ]),
        Deployment => block!("For deployment-related queries:", [
            "Provide deployment options",
            "List prerequisites",
            "Detail configuration steps",
            "Include best practices",
            "Discuss scaling aspects",
            "Explain maintenance procedures",
            "Reference relevant 3GPP specifications",
        ]),
        Interworking => block!("For interworking-related queries:", [
            "Explain interworking mechanisms",
            "Detail protocol conversions",
            "List supported features",
            "Include limitations",
            "Discuss compatibility aspects",
            "Describe roaming scenarios",
            "Reference relevant 3GPP specifications",
        ]),
        Migration => block!("For migration-related queries:", [
            "Provide migration paths",
            "Detail upgrade steps",
            "List compatibility issues",
            "Include rollback procedures",
            "Discuss impact analysis",
            "Explain testing approaches",
            "Reference relevant 3GPP specifications",
        ]),
        Troubleshooting => block!("For troubleshooting-related queries:", [
            "List common issues",
            "Provide diagnostic steps",
            "Detail resolution procedures",
            "Include logging aspects",
            "Discuss prevention methods",
            "Explain monitoring tools",
            "Reference relevant 3GPP specifications",
        ]),
        Compliance => block!("For compliance-related queries:", [
            "List applicable standards",
            "Detail requirements",
            "Explain conformance testing",
            "Include certification aspects",
            "Discuss validation methods",
            "Provide compliance checklist",
            "Reference relevant 3GPP specifications",
        ]),
        Feature => block!("For feature-related queries:", [
            "Explain feature capabilities",
            "Detail configuration options",
            "List dependencies",
            "Include limitations",
            "Discuss use cases",
            "Provide implementation guidance",
            "Reference relevant 3GPP specifications",
        ]),
        General => None,
    }
}
