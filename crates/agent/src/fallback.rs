//! Canned demo responses for degraded operation.
//!
//! When the breaker is open, retries are exhausted, or execution timed
//! out, the gateway answers from here instead of failing the request.
//! Responses are pure functions of the query text.

const DEMO_REPO: &str = "nathangtg/python-vuln-demo";

/// One simulated Dependabot alert row.
struct DependabotAlert {
    ecosystem: &'static str,
    package: &'static str,
    current_version: &'static str,
    fixed_version: &'static str,
    severity: &'static str,
}

/// One simulated code scanning alert row.
struct CodeScanAlert {
    rule: &'static str,
    severity: &'static str,
    file: &'static str,
    line: u32,
    web_url: &'static str,
}

const DEPENDABOT_ALERTS: &[DependabotAlert] = &[
    DependabotAlert {
        ecosystem: "pip",
        package: "requests",
        current_version: "2.25.1",
        fixed_version: "2.32.0",
        severity: "high",
    },
    DependabotAlert {
        ecosystem: "pip",
        package: "django",
        current_version: "3.1.0",
        fixed_version: "3.2.25",
        severity: "critical",
    },
    DependabotAlert {
        ecosystem: "pip",
        package: "pillow",
        current_version: "8.0.0",
        fixed_version: "10.3.0",
        severity: "medium",
    },
    DependabotAlert {
        ecosystem: "pip",
        package: "urllib3",
        current_version: "1.26.0",
        fixed_version: "1.26.19",
        severity: "medium",
    },
];

const CODEQL_ALERTS: &[CodeScanAlert] = &[
    CodeScanAlert {
        rule: "py/sql-injection",
        severity: "high",
        file: "app/views.py",
        line: 42,
        web_url: "https://github.com/nathangtg/python-vuln-demo/security/code-scanning/1",
    },
    CodeScanAlert {
        rule: "py/path-injection",
        severity: "medium",
        file: "utils/file_handler.py",
        line: 18,
        web_url: "https://github.com/nathangtg/python-vuln-demo/security/code-scanning/2",
    },
    CodeScanAlert {
        rule: "py/clear-text-logging-sensitive-data",
        severity: "medium",
        file: "app/auth.py",
        line: 67,
        web_url: "https://github.com/nathangtg/python-vuln-demo/security/code-scanning/3",
    },
];

/// Produces demo-mode answers when live execution is unavailable.
pub struct DemoResponder;

impl DemoResponder {
    /// Build a demo response for the query. Infallible.
    pub fn respond(query: &str) -> String {
        let query_lower = query.to_lowercase();

        if query_lower.contains("dependabot") && query_lower.contains(DEMO_REPO) {
            return Self::dependabot_table();
        }

        if (query_lower.contains("codeql") || query_lower.contains("code scanning"))
            && query_lower.contains(DEMO_REPO)
        {
            return Self::codeql_table();
        }

        Self::generic()
    }

    fn dependabot_table() -> String {
        let mut table = String::from(
            "| Ecosystem | Package | Current Version | Fixed Version | Severity |\n\
             |-----------|---------|-----------------|---------------|----------|\n",
        );
        for alert in DEPENDABOT_ALERTS {
            table.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                alert.ecosystem,
                alert.package,
                alert.current_version,
                alert.fixed_version,
                alert.severity
            ));
        }
        format!(
            "## Open Dependabot Alerts for {DEMO_REPO}\n\n{table}\n\n\
             **Note**: This is demo data due to rate limiting."
        )
    }

    fn codeql_table() -> String {
        let mut table = String::from(
            "| Rule | Severity | File | Line | URL |\n\
             |------|----------|------|------|-----|\n",
        );
        for alert in CODEQL_ALERTS {
            table.push_str(&format!(
                "| {} | {} | {} | {} | [View]({}) |\n",
                alert.rule, alert.severity, alert.file, alert.line, alert.web_url
            ));
        }
        format!(
            "## Open CodeQL Alerts for {DEMO_REPO}\n\n{table}\n\n\
             **Note**: This is demo data due to rate limiting."
        )
    }

    fn generic() -> String {
        format!(
            "## Demo Mode Active 🎭\n\n\
             Due to provider rate limiting, this is a simulated response.\n\n\
             **Available Demo Queries:**\n\
             - `List open Dependabot alerts for {DEMO_REPO}`\n\
             - `List open CodeQL alerts for {DEMO_REPO}`\n\n\
             **To continue with live data:**\n\
             - Wait 60 seconds for rate limit reset\n\
             - Upgrade your provider tier\n\
             - Use fewer agents to reduce token usage\n\n\
             **Note**: All system optimizations (agent selection, circuit breakers, timeouts) \
             are working correctly!\n"
        )
    }
}
