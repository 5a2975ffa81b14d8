use async_trait::async_trait;
use cep_batch::core::{MailTransport, OutgoingMail};
use cep_batch::domain::model::MailCredentials;
use cep_batch::{
    BatchConfig, BatchEngine, BatchError, BatchPipeline, LocalStorage, NotificationResources,
    Notifier, Resolver,
};
use httpmock::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct RecordingTransport {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(
        &self,
        mail: &OutgoingMail,
        credentials: &MailCredentials,
    ) -> cep_batch::Result<()> {
        assert_eq!(credentials.secret(), "app-password");
        self.sent.lock().await.push(mail.clone());
        Ok(())
    }
}

struct Fixture {
    dir: TempDir,
    primary: MockServer,
    secondary: MockServer,
}

impl Fixture {
    fn new(input_csv: &str) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ceps.csv"), input_csv).unwrap();
        std::fs::write(
            dir.path().join("email_modelo.html"),
            "<p>CEP ${code} - ${street}, ${district}, ${city}/${region}</p>",
        )
        .unwrap();
        std::fs::write(dir.path().join("pass.txt"), "app-password\n").unwrap();

        Self {
            dir,
            primary: MockServer::start(),
            secondary: MockServer::start(),
        }
    }

    fn config(&self) -> BatchConfig {
        let content = format!(
            r#"
[input]
path = "ceps.csv"

[[providers]]
name = "viacep"
url_template = "{}/ws/{{cep}}/json/"

[[providers]]
name = "opencep"
url_template = "{}/v1/{{cep}}"

[mail]
sender = "robot@example.com"
recipient = "ops@example.com"

[output]
path = "out"
"#,
            self.primary.base_url(),
            self.secondary.base_url()
        );
        BatchConfig::from_toml_str(&content).unwrap()
    }

    fn resources(&self) -> NotificationResources {
        NotificationResources {
            template_file: self.dir.path().join("email_modelo.html"),
            credentials_file: self.dir.path().join("pass.txt"),
            username: "robot@example.com".to_string(),
        }
    }

    fn engine(
        &self,
        resources: NotificationResources,
    ) -> BatchEngine<LocalStorage, BatchConfig, RecordingTransport> {
        let config = self.config();
        let resolver = Resolver::from_config(&config.providers).unwrap();
        let storage = LocalStorage::new(self.dir.path().to_string_lossy().into_owned());
        let pipeline = BatchPipeline::new(storage, config, resolver);
        let notifier = Notifier::new(
            RecordingTransport::default(),
            "robot@example.com",
            "ops@example.com",
        );
        BatchEngine::new(pipeline, notifier, resources)
    }

    fn out(&self, file: &str) -> std::path::PathBuf {
        self.dir.path().join("out").join(file)
    }
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

#[tokio::test]
async fn test_end_to_end_success_and_total_failure() {
    let fixture = Fixture::new("CEP\n01001-000\n00000-000\n");

    let primary_ok = fixture.primary.mock(|when, then| {
        when.method(GET).path("/ws/01001000/json/");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "cep": "01001-000",
                "logradouro": "Praça da Sé",
                "bairro": "Sé",
                "localidade": "São Paulo",
                "uf": "SP"
            }));
    });
    let primary_not_found = fixture.primary.mock(|when, then| {
        when.method(GET).path("/ws/00000000/json/");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"erro": true}));
    });
    let secondary_unused = fixture.secondary.mock(|when, then| {
        when.method(GET).path("/v1/01001000");
        then.status(200);
    });
    let secondary_not_found = fixture.secondary.mock(|when, then| {
        when.method(GET).path("/v1/00000000");
        then.status(404);
    });

    let engine = fixture.engine(fixture.resources());
    let outcome = engine.run().await.unwrap();

    primary_ok.assert_hits(1);
    primary_not_found.assert_hits(1);
    secondary_unused.assert_hits(0);
    secondary_not_found.assert_hits(1);

    assert_eq!(outcome.summary.total, 2);
    assert_eq!(outcome.summary.lookup_success, 1);
    assert_eq!(outcome.summary.lookup_failed, 1);
    assert_eq!(outcome.summary.notify_sent, 1);
    assert_eq!(outcome.summary.notify_failed, 1);

    let sent = engine.notifier().transport().sent.lock().await.clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ops@example.com");
    assert_eq!(sent[0].subject, "Informações para o CEP 01001000");
    assert_eq!(
        sent[0].html_body,
        "<p>CEP 01001000 - Praça da Sé, Sé, São Paulo/SP</p>"
    );

    // 第二次寫入覆蓋第一次，包含通知狀態
    let rows = read_rows(&fixture.out("dados_ceps_completos.csv"));
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "01001000");
    assert_eq!(&rows[0][6], "viacep");
    assert_eq!(&rows[0][7], "Success");
    assert_eq!(&rows[0][8], "Sent");
    assert_eq!(&rows[1][1], "00000000");
    assert_eq!(&rows[1][7], "Failed");
    assert_eq!(&rows[1][8], "Failed");

    let report = std::fs::read_to_string(fixture.out("relatorio.txt")).unwrap();
    assert!(report.contains("CEP: 01001000, STATUS: Success, EMAIL: Sent"));
    assert!(report.contains("CEP: 00000000, STATUS: Failed, EMAIL: Failed"));
    assert!(report.contains("Consultas de CEP - Sucesso: 1, Erros: 1"));
    assert!(report.contains("Envios de E-mails - Sucesso: 1, Erros: 1"));
    assert!(!report.contains("app-password"));
}

#[tokio::test]
async fn test_secondary_provider_fields_are_used_on_fallback() {
    let fixture = Fixture::new("CEP\n20040-020\n");

    fixture.primary.mock(|when, then| {
        when.method(GET).path("/ws/20040020/json/");
        then.status(503);
    });
    let secondary = fixture.secondary.mock(|when, then| {
        when.method(GET).path("/v1/20040020");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "cep": "20040-020",
                "logradouro": "Avenida Rio Branco",
                "bairro": "Centro",
                "localidade": "Rio de Janeiro",
                "uf": "RJ"
            }));
    });

    let outcome = fixture.engine(fixture.resources()).run().await.unwrap();

    secondary.assert_hits(1);
    assert_eq!(outcome.summary.lookup_success, 1);

    let rows = read_rows(&fixture.out("dados_ceps_completos.csv"));
    assert_eq!(&rows[0][4], "Rio de Janeiro");
    assert_eq!(&rows[0][5], "RJ");
    assert_eq!(&rows[0][6], "opencep");
}

#[tokio::test]
async fn test_missing_template_keeps_lookup_dataset() {
    let fixture = Fixture::new("CEP\n00000-000\n");

    fixture.primary.mock(|when, then| {
        when.method(GET).path("/ws/00000000/json/");
        then.status(200).json_body(serde_json::json!({"erro": true}));
    });
    fixture.secondary.mock(|when, then| {
        when.method(GET).path("/v1/00000000");
        then.status(404);
    });

    let mut resources = fixture.resources();
    resources.template_file = fixture.dir.path().join("missing.html");

    let err = fixture.engine(resources).run().await.unwrap_err();
    assert!(matches!(err, BatchError::ResourceError { .. }));

    let rows = read_rows(&fixture.out("dados_ceps_completos.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][7], "Failed");
    assert_eq!(&rows[0][8], "NotAttempted");
    assert!(!fixture.out("relatorio.txt").exists());
}

#[tokio::test]
async fn test_missing_code_column_fails_before_any_lookup() {
    let fixture = Fixture::new("codigo\n01001-000\n");

    let any_lookup = fixture.primary.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });

    let err = fixture.engine(fixture.resources()).run().await.unwrap_err();

    assert!(matches!(err, BatchError::MissingInputFieldError { .. }));
    any_lookup.assert_hits(0);
    assert!(!fixture.out("dados_ceps_completos.csv").exists());
}

#[tokio::test]
async fn test_empty_input_is_fatal() {
    let fixture = Fixture::new("CEP\n");

    let err = fixture.engine(fixture.resources()).run().await.unwrap_err();

    assert!(matches!(err, BatchError::EmptyInputError { .. }));
    assert!(!fixture.out("dados_ceps_completos.csv").exists());
}
