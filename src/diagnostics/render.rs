use crate::span::{SourceCache, Span};
use annotate_snippets::{self as snip, Snippet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationTy {
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub ty: AnnotationTy,
    pub span: Span,
    pub msg: String,
}

/// A message about a proof file, pointing at the parts it concerns.
#[derive(Debug, Clone)]
pub struct Report {
    pub level: ReportLevel,
    pub msg: String,
    pub annotations: Vec<Annotation>,
}

impl Report {
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Error,
            msg: msg.into(),
            annotations: Vec::new(),
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            level: ReportLevel::Warning,
            ..Self::error(msg)
        }
    }

    pub fn with_error(mut self, span: Span, msg: impl Into<String>) -> Self {
        self.annotations.push(Annotation {
            ty: AnnotationTy::Error,
            span,
            msg: msg.into(),
        });
        self
    }

    pub fn with_info(mut self, span: Span, msg: impl Into<String>) -> Self {
        self.annotations.push(Annotation {
            ty: AnnotationTy::Info,
            span,
            msg: msg.into(),
        });
        self
    }
}

fn snip_an_level(ty: AnnotationTy) -> snip::Level {
    match ty {
        AnnotationTy::Error => snip::Level::Error,
        AnnotationTy::Info => snip::Level::Info,
    }
}

pub fn render(report: &Report, sources: &SourceCache, styled: bool) -> String {
    let snip_level = match report.level {
        ReportLevel::Error => snip::Level::Error,
        ReportLevel::Warning => snip::Level::Warning,
    };

    let mut snip_msg = snip_level.title(&report.msg);

    for annotations in report
        .annotations
        .chunk_by(|a, b| a.span.file() == b.span.file())
    {
        let filename = annotations[0].span.file().as_str();
        let source = sources.get_text(annotations[0].span.file());

        let snippet = Snippet::source(source)
            .origin(filename)
            .fold(true)
            .annotations(
                annotations
                    .iter()
                    .map(|a| snip_an_level(a.ty).span(a.span.range()).label(&a.msg)),
            );
        snip_msg = snip_msg.snippet(snippet);
    }

    let renderer = if styled {
        snip::Renderer::styled()
    } else {
        snip::Renderer::plain()
    };
    renderer.render(snip_msg).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Filename;
    use std::path::PathBuf;

    #[test]
    fn renders_annotations_over_the_source() {
        let mut sources = SourceCache::new(PathBuf::from("."));
        let file = Filename::new("proof.toml");
        let text = "formula = \"(A → B)\"\ncitation = \"3 →E\"\n";
        sources.add_text(file, text.to_string());

        let start = text.find("\"3").unwrap();
        let report = Report::error("line 2 is not justified")
            .with_error(Span::new(file, start..start + 7), "→E cites two lines");
        let out = render(&report, &sources, false);
        assert!(out.contains("error: line 2 is not justified"));
        assert!(out.contains("proof.toml"));
        assert!(out.contains("→E cites two lines"));
    }
}
