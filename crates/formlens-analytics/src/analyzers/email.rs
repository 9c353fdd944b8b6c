use super::{AnalysisInput, FieldAnalyzer, CORPORATE_DOMAIN_MIN_OCCURRENCES};
use crate::extraction::value_to_text;
use crate::results::{
    DomainCount, EmailAnalytics, EmailOrigins, FieldAnalyticsResult, ProviderCount,
};
use crate::stats::{bump, percentage, rank_desc};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

const TOP_DOMAINS: usize = 20;

/// Consumer mail providers, matched against the full domain.
pub const POPULAR_PROVIDERS: [&str; 9] = [
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
    "mail.com",
    "zoho.com",
];

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Email fields: validity, domain breakdown and a corporate/personal split.
pub struct EmailAnalyzer;

impl EmailAnalyzer {
    pub fn analyze_emails(&self, input: &AnalysisInput<'_>) -> EmailAnalytics {
        let normalized: Vec<String> = input
            .responses
            .iter()
            .map(|r| value_to_text(&r.value).trim().to_lowercase())
            .collect();
        let valid: Vec<&str> = normalized
            .iter()
            .map(String::as_str)
            .filter(|email| is_valid_email(email))
            .collect();

        let valid_count = valid.len();
        let invalid_count = normalized.len() - valid_count;

        let mut domains: IndexMap<&str, usize> = IndexMap::new();
        let mut tlds: IndexMap<&str, usize> = IndexMap::new();
        let mut providers: IndexMap<String, usize> = IndexMap::new();
        let mut origins = EmailOrigins::default();

        for email in &valid {
            let Some((_, domain)) = email.rsplit_once('@') else {
                continue;
            };
            bump(&mut domains, domain);
            if let Some(tld) = domain.rsplit('.').next() {
                bump(&mut tlds, tld);
            }

            if is_popular_provider(domain) {
                bump(&mut providers, provider_name(domain));
                origins.personal += 1;
                continue;
            }

            // Classified as we go: the occurrence that reaches the threshold
            // moves the domain's earlier unknowns over to corporate.
            let seen = domains[domain];
            if seen == CORPORATE_DOMAIN_MIN_OCCURRENCES {
                origins.corporate += seen;
                origins.unknown = origins.unknown.saturating_sub(seen - 1);
            } else if seen > CORPORATE_DOMAIN_MIN_OCCURRENCES {
                origins.corporate += 1;
            } else {
                origins.unknown += 1;
            }
        }

        let domains = rank_desc(domains)
            .into_iter()
            .take(TOP_DOMAINS)
            .map(|(domain, count)| domain_count(domain, count, valid_count))
            .collect();
        let top_level_domains = rank_desc(tlds)
            .into_iter()
            .map(|(tld, count)| domain_count(tld, count, valid_count))
            .collect();
        let popular_providers = rank_desc(providers)
            .into_iter()
            .map(|(provider, count)| ProviderCount {
                provider,
                count,
                percentage: percentage(count, valid_count),
            })
            .collect();

        EmailAnalytics {
            base: input.base(input.responses.len()),
            valid_emails: valid_count,
            invalid_emails: invalid_count,
            validation_rate: percentage(valid_count, normalized.len()),
            domains,
            top_level_domains,
            popular_providers,
            corporate_vs_personal: origins,
        }
    }
}

impl FieldAnalyzer for EmailAnalyzer {
    fn analyze(&self, input: &AnalysisInput<'_>) -> FieldAnalyticsResult {
        FieldAnalyticsResult::Email(self.analyze_emails(input))
    }
}

/// `local@domain.tld` shape check, nothing stricter.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_SHAPE.is_match(candidate)
}

pub fn is_popular_provider(domain: &str) -> bool {
    POPULAR_PROVIDERS.contains(&domain)
}

/// `gmail.com` -> `gmail`
fn provider_name(domain: &str) -> String {
    domain.replace(".com", "").replace('.', "")
}

fn domain_count(domain: &str, count: usize, valid: usize) -> DomainCount {
    DomainCount {
        domain: domain.to_string(),
        count,
        percentage: percentage(count, valid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::responses;
    use formlens_core::FieldType;
    use serde_json::{json, Value};

    fn run(values: Vec<Value>) -> EmailAnalytics {
        let responses = responses(values);
        let field_type = FieldType::Email;
        EmailAnalyzer.analyze_emails(&AnalysisInput {
            responses: &responses,
            field_id: "contact",
            field_type: &field_type,
            field_label: "Contact",
            total_form_responses: responses.len(),
        })
    }

    #[test]
    fn test_validation_and_domains() {
        let result = run(vec![
            json!("USER@EXAMPLE.COM"),
            json!("user2@example.com"),
            json!("bad-email"),
        ]);

        assert_eq!(result.valid_emails, 2);
        assert_eq!(result.invalid_emails, 1);
        assert_eq!(result.validation_rate, 66.67);
        assert_eq!(
            result.domains,
            vec![DomainCount {
                domain: "example.com".into(),
                count: 2,
                percentage: 100.0
            }]
        );
        assert_eq!(result.top_level_domains[0].domain, "com");
        assert_eq!(result.base.total_responses, 3);
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_popular_providers() {
        let result = run(vec![
            json!("a@gmail.com"),
            json!("b@gmail.com"),
            json!("c@mail.com"),
            json!("d@protonmail.com"),
        ]);

        let providers: Vec<(&str, usize)> = result
            .popular_providers
            .iter()
            .map(|p| (p.provider.as_str(), p.count))
            .collect();
        assert_eq!(providers, vec![("gmail", 2), ("mail", 1), ("protonmail", 1)]);
        assert_eq!(result.popular_providers[0].percentage, 50.0);
        assert_eq!(result.corporate_vs_personal.personal, 4);
        assert_eq!(result.corporate_vs_personal.corporate, 0);
    }

    #[test]
    fn test_corporate_threshold_is_retroactive() {
        let result = run(vec![
            json!("a@acme.io"),
            json!("b@acme.io"),
            json!("x@tiny.org"),
            json!("c@acme.io"),
            json!("d@acme.io"),
            json!("y@yahoo.com"),
        ]);

        assert_eq!(
            result.corporate_vs_personal,
            EmailOrigins {
                corporate: 4,
                personal: 1,
                unknown: 1
            }
        );
        let origins = result.corporate_vs_personal;
        assert_eq!(
            origins.corporate + origins.personal + origins.unknown,
            result.valid_emails
        );
    }

    #[test]
    fn test_domains_truncated_tlds_not() {
        let values = (0..25).map(|i| json!(format!("u@d{}.tld{}", i, i))).collect();
        let result = run(values);
        assert_eq!(result.domains.len(), 20);
        assert_eq!(result.top_level_domains.len(), 25);
        assert_eq!(result.domains[0].percentage, 4.0);
    }

    #[test]
    fn test_no_valid_emails() {
        let result = run(vec![json!("nope"), json!(42)]);
        assert_eq!(result.valid_emails, 0);
        assert_eq!(result.invalid_emails, 2);
        assert_eq!(result.validation_rate, 0.0);
        assert!(result.domains.is_empty());
        assert!(result.top_level_domains.is_empty());
        assert!(result.popular_providers.is_empty());
        assert_eq!(result.corporate_vs_personal, EmailOrigins::default());
    }
}
