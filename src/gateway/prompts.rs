//! Per-operation system instructions and user prompt templates

use serde_json::Value;

use crate::types::{OperationContext, OperationType};

/// Rendered in place of any context key the caller did not supply
pub const MISSING_VALUE: &str = "N/A";

/// Probe used by health checks
pub const HEALTH_SYSTEM_PROMPT: &str = "You are a test system.";
pub const HEALTH_USER_PROMPT: &str = "Respond with 'OK' if you are working.";

/// One `- Label: value unit` line of a user prompt
struct Field {
    label: &'static str,
    key: &'static str,
    unit: &'static str,
}

const fn field(label: &'static str, key: &'static str, unit: &'static str) -> Field {
    Field { label, key, unit }
}

struct PromptTemplate {
    header: &'static str,
    fields: &'static [Field],
    footer: &'static str,
}

const DOMAIN_APPROVAL: PromptTemplate = PromptTemplate {
    header: "Domain Registration Request:",
    fields: &[
        field("Domain Name", "domain_name", ""),
        field("TLD", "tld", ""),
        field("Registrant", "registrant_address", ""),
        field("Content Type", "content_type", ""),
        field("Additional Info", "additional_info", ""),
    ],
    footer: "Please evaluate this domain registration request.",
};

const FEE_ADJUSTMENT: PromptTemplate = PromptTemplate {
    header: "Current Platform Metrics:",
    fields: &[
        field("Daily Registrations", "daily_registrations", ""),
        field("Current Fee", "current_fee", " ETH"),
        field("Platform Utilization", "utilization_rate", "%"),
        field("Competitor Average Fee", "competitor_avg_fee", " ETH"),
        field("Revenue Trend", "revenue_trend", ""),
    ],
    footer: "Recommend fee adjustments based on these metrics.",
};

const GOVERNANCE_PROPOSAL: PromptTemplate = PromptTemplate {
    header: "Platform Status:",
    fields: &[
        field("Active Domains", "active_domains", ""),
        field("Staking Participation", "staking_participation", "%"),
        field("User Feedback Summary", "user_feedback", ""),
        field("Technical Issues", "technical_issues", ""),
        field("Feature Requests", "feature_requests", ""),
    ],
    footer: "Generate a governance proposal to address platform needs.",
};

const MARKET_ANALYSIS: PromptTemplate = PromptTemplate {
    header: "Market Data:",
    fields: &[
        field("Platform Growth Rate", "growth_rate", "%"),
        field("Market Share", "market_share", "%"),
        field("Competitor Activities", "competitor_activities", ""),
        field("Industry Trends", "industry_trends", ""),
        field("User Demographics", "user_demographics", ""),
    ],
    footer: "Provide comprehensive market analysis and recommendations.",
};

const USER_SUPPORT: PromptTemplate = PromptTemplate {
    header: "Support Request:",
    fields: &[
        field("User Query", "user_query", ""),
        field("User Level", "user_level", ""),
        field("Previous Context", "previous_context", ""),
    ],
    footer: "Answer the user's question.",
};

const ANOMALY_DETECTION: PromptTemplate = PromptTemplate {
    header: "Platform Activity Data:",
    fields: &[
        field("Recent Transactions", "recent_transactions", ""),
        field("User Behavior Patterns", "user_patterns", ""),
        field("System Metrics", "system_metrics", ""),
        field("Error Rates", "error_rates", ""),
    ],
    footer: "Analyze for potential anomalies or security threats.",
};

fn template(operation: OperationType) -> &'static PromptTemplate {
    match operation {
        OperationType::DomainApproval => &DOMAIN_APPROVAL,
        OperationType::FeeAdjustment => &FEE_ADJUSTMENT,
        OperationType::GovernanceProposal => &GOVERNANCE_PROPOSAL,
        OperationType::MarketAnalysis => &MARKET_ANALYSIS,
        OperationType::UserSupport => &USER_SUPPORT,
        OperationType::AnomalyDetection => &ANOMALY_DETECTION,
    }
}

/// Operation-specific system instruction
pub fn system_prompt(operation: OperationType) -> &'static str {
    match operation {
        OperationType::DomainApproval => {
            "You are an AI system for the NXD Platform responsible for autonomous domain approval.
Evaluate domain registration requests based on:
1. Name appropriateness (no offensive content, spam, or trademark violations)
2. TLD compatibility
3. Compliance with platform policies
4. Potential value and utility

Respond with JSON: {\"approved\": boolean, \"reason\": string, \"score\": number (0-100)}"
        }
        OperationType::FeeAdjustment => {
            "You are an AI system managing dynamic fee adjustments for the NXD Platform.
Analyze market conditions, demand patterns, and platform utilization to recommend fee changes.
Consider:
1. Current registration volume
2. Market competition
3. Platform sustainability
4. User adoption trends

Respond with JSON: {\"fee_adjustment\": number (percentage), \"reason\": string, \"duration\": string}"
        }
        OperationType::GovernanceProposal => {
            "You are an AI system generating governance proposals for the NXD DAO.
Create well-structured proposals for platform improvements based on:
1. Platform analytics and user feedback
2. Technical requirements
3. Market opportunities
4. Community needs

Respond with JSON: {\"title\": string, \"description\": string, \"actions\": array, \"voting_duration\": number}"
        }
        OperationType::MarketAnalysis => {
            "You are an AI analyst for the NXD Platform providing market insights.
Analyze Web3 domain market trends, competitor activities, and growth opportunities.

Respond with JSON: {\"trends\": array, \"opportunities\": array, \"threats\": array, \"recommendations\": array}"
        }
        OperationType::UserSupport => {
            "You are a helpful AI assistant for the NXD Platform.
Provide clear, accurate information about domain registration, staking, governance, and platform features.
Escalate complex technical issues to human support.

Always be helpful, professional, and accurate."
        }
        OperationType::AnomalyDetection => {
            "You are an AI security system for the NXD Platform.
Analyze platform activities for potential anomalies, security threats, or unusual patterns.

Respond with JSON: {\"anomaly_detected\": boolean, \"severity\": string, \"description\": string, \"recommended_actions\": array}"
        }
    }
}

/// Render `context` through the operation's template. Keys the template
/// does not name are ignored; keys it names but the context lacks become
/// [`MISSING_VALUE`].
pub fn render_user_prompt(operation: OperationType, context: &OperationContext) -> String {
    let template = template(operation);
    let mut prompt = String::with_capacity(256);

    prompt.push_str(template.header);
    prompt.push('\n');

    for field in template.fields {
        let line = match context.get(field.key).and_then(render_value) {
            Some(value) => format!("- {}: {}{}\n", field.label, value, field.unit),
            None => format!("- {}: {}\n", field.label, MISSING_VALUE),
        };
        prompt.push_str(&line);
    }

    prompt.push('\n');
    prompt.push_str(template.footer);
    prompt
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: Value) -> OperationContext {
        match value {
            Value::Object(map) => map,
            _ => OperationContext::new(),
        }
    }

    #[test]
    fn test_render_known_and_missing_keys() {
        let ctx = context(json!({
            "domain_name": "vault",
            "tld": "nxd",
            "unexpected": "ignored"
        }));
        let prompt = render_user_prompt(OperationType::DomainApproval, &ctx);

        assert!(prompt.starts_with("Domain Registration Request:"));
        assert!(prompt.contains("- Domain Name: vault\n"));
        assert!(prompt.contains("- TLD: nxd\n"));
        assert!(prompt.contains("- Registrant: N/A\n"));
        assert!(!prompt.contains("ignored"));
        assert!(prompt.ends_with("Please evaluate this domain registration request."));
    }

    #[test]
    fn test_render_units_and_structured_values() {
        let ctx = context(json!({
            "current_fee": 0.01,
            "utilization_rate": 72,
            "revenue_trend": null
        }));
        let prompt = render_user_prompt(OperationType::FeeAdjustment, &ctx);
        assert!(prompt.contains("- Current Fee: 0.01 ETH\n"));
        assert!(prompt.contains("- Platform Utilization: 72%\n"));
        assert!(prompt.contains("- Revenue Trend: N/A\n"));

        let ctx = context(json!({ "technical_issues": ["slow sync", "gas spikes"] }));
        let prompt = render_user_prompt(OperationType::GovernanceProposal, &ctx);
        assert!(prompt.contains("- Technical Issues: [\"slow sync\",\"gas spikes\"]\n"));
    }

    #[test]
    fn test_every_operation_renders_with_empty_context() {
        for operation in OperationType::ALL {
            let prompt = render_user_prompt(operation, &OperationContext::new());
            assert!(prompt.contains(MISSING_VALUE));
            assert!(!system_prompt(operation).is_empty());
        }
    }
}
