use crate::core::BatchResultSet;
use crate::domain::model::{LookupStatus, NotifyStatus};
use chrono::{DateTime, Local};

pub const REPORT_TITLE: &str = "Relatório de Processamento de CEPs";
const PAGE_BREAK: &str = "\u{c}";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub lookup_success: usize,
    pub lookup_failed: usize,
    pub notify_sent: usize,
    pub notify_failed: usize,
}

impl ReportSummary {
    pub fn from_batch(batch: &BatchResultSet) -> Self {
        let count_lookup =
            |status: LookupStatus| batch.iter().filter(|r| r.lookup_status == status).count();
        let count_notify =
            |status: NotifyStatus| batch.iter().filter(|r| r.notify_status == status).count();

        Self {
            total: batch.len(),
            lookup_success: count_lookup(LookupStatus::Success),
            lookup_failed: count_lookup(LookupStatus::Failed),
            notify_sent: count_notify(NotifyStatus::Sent),
            notify_failed: count_notify(NotifyStatus::Failed),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportPage {
    pub number: usize,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub generated_at: DateTime<Local>,
    pub pages: Vec<ReportPage>,
    pub summary: ReportSummary,
}

impl ReportArtifact {
    /// 純文字輸出，頁與頁之間以換頁字元分隔
    pub fn to_text(&self) -> String {
        let rendered: Vec<String> = self
            .pages
            .iter()
            .map(|page| {
                let mut text = format!("{}\n\n", REPORT_TITLE);
                for line in &page.lines {
                    text.push_str(line);
                    text.push('\n');
                }
                text.push_str(&format!("\nPágina {}\n", page.number));
                text
            })
            .collect();
        rendered.join(PAGE_BREAK)
    }
}

pub struct ReportAggregator {
    lines_per_page: usize,
}

impl ReportAggregator {
    pub fn new(lines_per_page: usize) -> Self {
        Self {
            lines_per_page: lines_per_page.max(1),
        }
    }

    pub fn render(&self, batch: &BatchResultSet) -> ReportArtifact {
        let summary = ReportSummary::from_batch(batch);
        let generated_at = Local::now();

        let record_lines: Vec<String> = batch
            .iter()
            .map(|record| {
                format!(
                    "CEP: {}, STATUS: {}, EMAIL: {}",
                    record.code, record.lookup_status, record.notify_status
                )
            })
            .collect();

        let mut pages: Vec<ReportPage> = record_lines
            .chunks(self.lines_per_page)
            .enumerate()
            .map(|(index, lines)| ReportPage {
                number: index + 1,
                lines: lines.to_vec(),
            })
            .collect();

        pages.push(ReportPage {
            number: pages.len() + 1,
            lines: vec![
                "Resumo do Processamento".to_string(),
                format!("Total de registros: {}", summary.total),
                format!(
                    "Consultas de CEP - Sucesso: {}, Erros: {}",
                    summary.lookup_success, summary.lookup_failed
                ),
                format!(
                    "Envios de E-mails - Sucesso: {}, Erros: {}",
                    summary.notify_sent, summary.notify_failed
                ),
                format!("Gerado em: {}", generated_at.format("%d/%m/%Y %H:%M:%S")),
            ],
        });

        ReportArtifact {
            generated_at,
            pages,
            summary,
        }
    }
}
