//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use patentlens_domain::{group_family_by_year, PatentRecord, Provider};
use patentlens_extractor::{ExtractorConfig, PatentExtractor, SourceKind, SourceRouter};
use patentlens_fetch::{DisabledProber, DocumentFetcher, HttpFetcher, Prober};
use std::fs;
use std::sync::Arc;

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let record = match &args.file {
        Some(path) => {
            let html = fs::read_to_string(path)?;
            let provider = args.provider.map(Provider::from).unwrap_or(Provider::GooglePatents);
            let url = args
                .identifier
                .clone()
                .unwrap_or_else(|| provider.origin().to_string());

            if args.offline {
                extract_page(&html, &url, provider, DisabledProber, &config.extractor).await?
            } else {
                let http = HttpFetcher::new(config.fetch.clone())?;
                extract_page(&html, &url, provider, http, &config.extractor).await?
            }
        }
        None => {
            let identifier = args.identifier.as_deref().ok_or_else(|| {
                CliError::InvalidInput("Specify a URL, a publication number or --file".to_string())
            })?;
            if args.offline {
                return Err(CliError::InvalidInput(
                    "--offline needs a saved page (--file)".to_string(),
                ));
            }
            fetch_and_extract(identifier, args.provider.map(Provider::from), config).await?
        }
    };

    println!("{}", formatter.format_record(&record)?);

    if args.family_by_year {
        let groups = group_family_by_year(&record.family);
        println!("{}", formatter.format_family_groups(&groups)?);
    }

    Ok(())
}

/// Extract a record from page markup, probing document links through `prober`.
pub async fn extract_page<P: Prober>(
    html: &str,
    url: &str,
    provider: Provider,
    prober: P,
    config: &ExtractorConfig,
) -> Result<PatentRecord> {
    let extractor = PatentExtractor::new(prober, config.clone())?;
    Ok(extractor.extract(html, url, provider).await)
}

/// Route an identifier, fetch the page and extract it.
async fn fetch_and_extract(
    identifier: &str,
    provider: Option<Provider>,
    config: &Config,
) -> Result<PatentRecord> {
    let routed = SourceRouter::new(config.extractor.clone()).route(identifier)?;
    let SourceKind::Provider(routed_provider) = routed.target else {
        return Err(CliError::InvalidInput(format!(
            "{} is not a patent page",
            routed.target_url
        )));
    };

    let http = Arc::new(HttpFetcher::new(config.fetch.clone())?);
    let document = http.fetch(&routed.target_url).await?;
    if !document.is_html() {
        return Err(CliError::InvalidInput(format!(
            "{} returned {}, not HTML",
            routed.target_url, document.content_type
        )));
    }
    let html = document.text().await?;

    extract_page(
        &html,
        &routed.target_url,
        provider.unwrap_or(routed_provider),
        http,
        &config.extractor,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::io::Write;

    const PAGE: &str = r#"<html><body>
        <h2 id="title">Folding ladder</h2>
        <span itemprop="publicationNumber">US1234567B1</span>
        <table>
          <tr itemprop="family"><td itemprop="publicationNumber">US1234567B1</td><td>2001-07-03</td><td itemprop="country">US</td></tr>
        </table>
    </body></html>"#;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Json, false)
    }

    #[tokio::test]
    async fn test_extract_page_offline() {
        let record = extract_page(
            PAGE,
            "https://patents.google.com/patent/US1234567B1/en",
            Provider::GooglePatents,
            DisabledProber,
            &ExtractorConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(record.title, "Folding ladder");
        assert_eq!(record.family.len(), 1);
        assert_eq!(record.document_url, None);
    }

    #[tokio::test]
    async fn test_execute_extract_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PAGE.as_bytes()).unwrap();

        let args = ExtractArgs {
            identifier: None,
            file: Some(file.path().to_path_buf()),
            provider: None,
            offline: true,
            family_by_year: true,
        };
        let result = execute_extract(args, &Config::default(), &formatter()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_identifier() {
        let args = ExtractArgs {
            identifier: None,
            file: None,
            provider: None,
            offline: false,
            family_by_year: false,
        };
        let result = execute_extract(args, &Config::default(), &formatter()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_offline_requires_file() {
        let args = ExtractArgs {
            identifier: Some("US1234567B1".to_string()),
            file: None,
            provider: None,
            offline: true,
            family_by_year: false,
        };
        let result = execute_extract(args, &Config::default(), &formatter()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_non_patent_url_rejected_before_fetch() {
        let result = fetch_and_extract(
            "https://example.com/drawing.png",
            None,
            &Config::default(),
        )
        .await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let args = ExtractArgs {
            identifier: None,
            file: Some("/nonexistent/page.html".into()),
            provider: None,
            offline: true,
            family_by_year: false,
        };
        let result = execute_extract(args, &Config::default(), &formatter()).await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
