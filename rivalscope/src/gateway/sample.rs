//! Sample gateway payloads served by the local `scout-gateway` server

use serde_json::{json, Value};

/// Wire-format success body for `query`, in the shape the real gateway uses
pub fn research_body(query: &str) -> Value {
    json!({
        "companies": [
            {
                "name": "TechCorp Solutions",
                "description": "Cloud-based business management software with AI-powered analytics and reporting.",
                "website": "https://example.com/techcorp",
                "pricing_model": "Subscription",
                "is_open_source": false,
                "tech_stack": ["Go", "PostgreSQL", "React"],
                "language_support": ["JavaScript", "Python"],
                "api_available": "REST and GraphQL",
                "integration_capabilities": ["Slack", "Salesforce"],
                "reason": "Direct competitor with a similar target market and feature set."
            },
            {
                "name": "InnovateSoft",
                "description": "Business automation platform focused on workflow optimization and team collaboration.",
                "website": "https://example.com/innovatesoft",
                "pricing_model": "Freemium",
                "is_open_source": true,
                "tech_stack": ["Rust", "SQLite"],
                "api_available": true
            },
            {
                "name": "DataDrive Pro",
                "description": "Enterprise data management and analytics with real-time dashboards.",
                "website": "https://example.com/datadrive"
            },
            {
                "name": "CloudFlow Systems",
                "description": "Cloud-native platform with integrated CRM and project management tools.",
                "website": "https://example.com/cloudflow",
                "integration_capabilities": ["Zapier"]
            }
        ],
        "developer_recommendations": format!(
            "For \"{}\", start with InnovateSoft if you need self-hosting; \
             TechCorp Solutions has the broadest integration catalogue.",
            query
        )
    })
}
