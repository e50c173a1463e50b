//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        extract_record, ExtractorConfig, PageDocument, PatentExtractor, SourceRouter,
        ESPACENET, GOOGLE_PATENTS,
    };
    use patentlens_domain::{PatentDate, Provider, TimelineEvent};
    use patentlens_fetch::{DisabledProber, MockFetcher};

    const GOOGLE_PAGE: &str = include_str!("../tests/fixtures/google_patent.html");
    const GOOGLE_NO_TIMELINE: &str = include_str!("../tests/fixtures/google_no_timeline.html");
    const ESPACENET_PAGE: &str = include_str!("../tests/fixtures/espacenet_patent.html");

    const GOOGLE_URL: &str = "https://patents.google.com/patent/US8900904B2/en";
    const ESPACENET_URL: &str = "https://worldwide.espacenet.com/patent/search/family/042199146/publication/US8900904B2?q=US8900904B2";
    const STORED_PDF: &str = "https://patentimages.storage.googleapis.com/aa/bb/US8900904.pdf";

    fn event(date: &str, title: &str) -> TimelineEvent {
        TimelineEvent::new(date, title)
    }

    #[test]
    fn test_google_bibliographic_fields() {
        let doc = PageDocument::parse(GOOGLE_PAGE, GOOGLE_URL);
        let record = extract_record(&doc, &GOOGLE_PATENTS);

        assert_eq!(record.title, "Wireless power transfer device");
        assert_eq!(record.publication_number, "US8900904B2");
        assert_eq!(record.application_number, "US13/043,170");
        assert_eq!(record.inventors, vec!["Jane Q. Engineer", "John Roe"]);
        assert_eq!(record.assignee, "Acme Power Corp");
        assert_eq!(record.status, "Active");
        assert_eq!(record.filing_date, PatentDate::parse("2011-03-08"));
        assert_eq!(record.publication_date, PatentDate::parse("2014-12-02"));
        assert_eq!(record.priority_date, PatentDate::parse("2010-10-15"));
        assert_eq!(
            record.abstract_text,
            "A device transfers power wirelessly between two coils."
        );
        assert_eq!(record.drawings.len(), 2);
        assert!(record.claims_html.contains(r#"<div class="claim">"#));
        assert!(record.description_html.contains("power transfer"));
        assert_eq!(record.document_url, None);
    }

    #[test]
    fn test_google_tables() {
        let doc = PageDocument::parse(GOOGLE_PAGE, GOOGLE_URL);
        let record = extract_record(&doc, &GOOGLE_PATENTS);

        assert_eq!(record.classifications.len(), 2);
        assert_eq!(record.classifications[1].code, "H01F38/14");
        assert_eq!(record.classifications[1].description, "Rotary transformers");

        assert_eq!(record.citations.len(), 2);
        assert_eq!(record.citations[0].number, "US7741734B2");
        assert_eq!(record.citations[0].title, "Wireless non-radiative energy transfer");
        assert_eq!(record.citations[1].number, "US6301128B1");
        assert_eq!(record.citations[1].assignee, "Delta Electronics");

        assert_eq!(record.cited_by.len(), 1);
        assert_eq!(record.family.len(), 3);
        assert_eq!(record.family[1].country, "KR");
        assert_eq!(record.similar_documents[0].number, "US8461719B2");
        assert_eq!(record.legal_events.len(), 3);
        assert_eq!(record.legal_events[1].description, "STCF");
    }

    #[test]
    fn test_widget_timeline_stops_at_expiration() {
        let doc = PageDocument::parse(GOOGLE_PAGE, GOOGLE_URL);
        let record = extract_record(&doc, &GOOGLE_PATENTS);

        assert_eq!(
            record.events,
            vec![
                event("2010-10-15", "Priority to KR20100100844"),
                event("2011-03-08", "Application filed by Acme Power Corp"),
                event("2012-04-19", "Publication of US20120091551A1"),
                event("2014-12-02", "Application granted"),
                event("2031-05-13", "Anticipated expiration"),
                TimelineEvent::status("Active"),
            ]
        );
    }

    #[test]
    fn test_synthetic_timeline() {
        let doc = PageDocument::parse(GOOGLE_NO_TIMELINE, "https://patents.google.com/patent/US1234567B1/en");
        let record = extract_record(&doc, &GOOGLE_PATENTS);

        assert_eq!(record.title, "Folding ladder");
        assert_eq!(record.inventors, vec!["Ada Builder", "Bob Climber"]);
        assert_eq!(record.status, "Expired - Lifetime");
        assert_eq!(record.legal_events.len(), 5);
        assert_eq!(
            record.events,
            vec![
                event("1999-02-14", "Application filed by Ladder Works Inc"),
                event("1999-05-01", "Assigned to Ladder Works Inc"),
                event("2001-07-03", "Publication of US1234567B1"),
                event("2005-01-20", "Maintenance fee payment"),
                event("2019-02-14", "Expired due to end of term"),
                TimelineEvent::status("Expired - Lifetime"),
            ]
        );
    }

    #[test]
    fn test_espacenet_strategy() {
        let doc = PageDocument::parse(ESPACENET_PAGE, ESPACENET_URL);
        let record = extract_record(&doc, &ESPACENET);

        assert_eq!(record.title, "Wireless power transfer device");
        assert_eq!(record.publication_number, "US8900904B2, US20120091551A1");
        assert_eq!(record.assignee, "ACME POWER CORP");
        assert_eq!(record.abstract_text, "A device transfers power wirelessly.");
        assert_eq!(record.priority_date, PatentDate::parse("2010-10-15"));
        assert_eq!(record.classifications.len(), 2);
        assert_eq!(record.classifications[1].description, "");
        assert_eq!(
            record.drawings,
            vec!["https://worldwide.espacenet.com/images/US8900904B2-1.png"]
        );
        assert_eq!(record.family[0].number, "KR101228556B1");
        assert_eq!(record.claims_html, "<p>1. A device.</p>");
        assert_eq!(record.events.len(), 3);
        assert_eq!(record.events[2], event("2014-12-02", "Publication of US8900904B2, US20120091551A1"));
    }

    #[test]
    fn test_empty_page_yields_markers() {
        let doc = PageDocument::parse("<html><body></body></html>", "https://patents.google.com/patent/");
        let record = extract_record(&doc, &GOOGLE_PATENTS);

        assert_eq!(record.title, "");
        assert_eq!(record.publication_number, "");
        assert!(record.filing_date.is_unknown());
        assert!(record.events.is_empty());
        assert!(record.citations.is_empty());
    }

    #[test]
    fn test_synthetic_timeline_keeps_prose_filing_date() {
        let html = r#"<html><body>
            <span itemprop="publicationNumber">US8900904B2</span>
            <time itemprop="filingDate">March 8, 2011</time>
            <time itemprop="publicationDate">2014-12-02</time>
            <span itemprop="status">Active</span>
        </body></html>"#;
        let record = extract_record(&PageDocument::parse(html, GOOGLE_URL), &GOOGLE_PATENTS);

        assert!(record.filing_date.is_unknown());
        assert_eq!(
            record.events,
            vec![
                event("2014-12-02", "Publication of US8900904B2"),
                event("March 8, 2011", "Application filed by Unknown Assignee"),
                TimelineEvent::status("Active"),
            ]
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        for (html, url, strategy) in [
            (GOOGLE_PAGE, GOOGLE_URL, &GOOGLE_PATENTS),
            (GOOGLE_NO_TIMELINE, GOOGLE_URL, &GOOGLE_PATENTS),
            (ESPACENET_PAGE, ESPACENET_URL, &ESPACENET),
        ] {
            let first = extract_record(&PageDocument::parse(html, url), strategy);
            let second = extract_record(&PageDocument::parse(html, url), strategy);
            assert_eq!(
                serde_json::to_string(&first).unwrap(),
                serde_json::to_string(&second).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn test_full_extraction_with_anchor_link() {
        let prober = MockFetcher::new();
        // the /pdf endpoint lands on a viewer page, not a stored document
        prober.add_redirect(format!("{}/pdf", GOOGLE_URL), "https://patents.google.com/viewer");
        prober.add_html("https://patents.google.com/viewer", "<html></html>");
        prober.add_document(STORED_PDF, "application/pdf", "%PDF-1.4");

        let extractor = PatentExtractor::new(prober.clone(), ExtractorConfig::default()).unwrap();
        let record = extractor.extract(GOOGLE_PAGE, GOOGLE_URL, Provider::GooglePatents).await;

        assert_eq!(record.document_url.as_deref(), Some(STORED_PDF));
        assert_eq!(prober.call_count(), 2);
    }

    #[tokio::test]
    async fn test_full_extraction_without_network() {
        let extractor = PatentExtractor::new(DisabledProber, ExtractorConfig::default()).unwrap();
        let record = extractor.extract(GOOGLE_PAGE, GOOGLE_URL, Provider::GooglePatents).await;

        assert_eq!(record.document_url, None);
        assert_eq!(record.title, "Wireless power transfer device");
    }

    #[tokio::test]
    async fn test_routed_espacenet_request_extracts_google_page() {
        let router = SourceRouter::new(ExtractorConfig::default());
        let routed = router.route(ESPACENET_URL).unwrap();
        assert!(routed.rewritten());

        let prober = MockFetcher::new();
        prober.add_document(
            "https://patentimages.storage.googleapis.com/patents/us8900904b2.pdf",
            "application/pdf",
            "%PDF",
        );
        let extractor = PatentExtractor::new(prober, ExtractorConfig::default()).unwrap();
        let record = extractor
            .extract(GOOGLE_NO_TIMELINE, &routed.target_url, Provider::GooglePatents)
            .await;

        // the page's own number drives the constructed link
        assert_eq!(record.publication_number, "US1234567B1");
        assert_eq!(record.document_url, None);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractorConfig {
            constructed_url_template: "https://example.com/static.pdf".to_string(),
            ..ExtractorConfig::default()
        };
        assert!(PatentExtractor::new(DisabledProber, config).is_err());
    }
}
