//! Terminal projectors.
//!
//! A terminal cannot take lines back, so `Clear` and `RemoveLast` are shown
//! as markers instead of erasing output.

use std::io::{self, Write};

use trajview_replay::{Controls, EmptyState, ProjectedMessage, Projector, RenderEvent};

const RESULT_PREVIEW_CHARS: usize = 240;

/// Human-readable output.
pub struct TerminalProjector<W> {
    out: W,
    /// Print progress after every transition, not only on state changes.
    verbose_controls: bool,
    last_controls: Option<Controls>,
}

impl<W: Write> TerminalProjector<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            verbose_controls: false,
            last_controls: None,
        }
    }

    pub fn verbose_controls(mut self, verbose: bool) -> Self {
        self.verbose_controls = verbose;
        self
    }

    fn write_event(&mut self, event: &RenderEvent) -> io::Result<()> {
        match event {
            RenderEvent::Clear => writeln!(self.out, "──────── cleared ────────"),
            RenderEvent::Append(message) => self.write_message(message),
            RenderEvent::RemoveLast => writeln!(self.out, "  ⟲ step back"),
            RenderEvent::Controls(controls) => self.write_controls(*controls),
            RenderEvent::Status { text } => writeln!(self.out, "» {text}"),
            RenderEvent::EmptyState(state) => self.write_empty(state),
            RenderEvent::Catalog { models, selected } => {
                let selected = selected.as_deref().unwrap_or("-");
                writeln!(self.out, "models: {} (selected: {selected})", models.join(", "))
            }
            RenderEvent::Tasks {
                model,
                tasks,
                selected,
            } => {
                let selected = selected.as_deref().unwrap_or("-");
                writeln!(
                    self.out,
                    "tasks of {model}: {} (selected: {selected})",
                    tasks.join(", ")
                )
            }
        }
    }

    fn write_message(&mut self, projected: &ProjectedMessage) -> io::Result<()> {
        let message = &projected.message;
        let marker = if message.is_synthetic { " *" } else { "" };
        writeln!(
            self.out,
            "\n[{}] {}{marker}",
            message.index + 1,
            message.raw_role
        )?;
        if let Some(timestamp) = &message.timestamp {
            writeln!(self.out, "    @ {timestamp}")?;
        }
        for line in message.content.lines() {
            writeln!(self.out, "    {line}")?;
        }
        for (n, group) in projected.tool_groups.iter().enumerate() {
            if projected.tool_groups.len() > 1 {
                writeln!(self.out, "    tools #{}", n + 1)?;
            }
            for tool in &group.tools {
                writeln!(
                    self.out,
                    "    ↳ {}({}) [{}]",
                    tool.call.name, tool.call.arguments_json, tool.status
                )?;
                if let Some(result) = &tool.result {
                    writeln!(self.out, "      {}", preview(&result.content))?;
                }
            }
        }
        Ok(())
    }

    fn write_controls(&mut self, controls: Controls) -> io::Result<()> {
        let changed = self
            .last_controls
            .is_none_or(|last| last.state != controls.state);
        self.last_controls = Some(controls);
        if !changed && !self.verbose_controls {
            return Ok(());
        }
        writeln!(
            self.out,
            "[{}] {}/{} ({}%)",
            controls.state, controls.cursor, controls.total, controls.percent
        )
    }

    fn write_empty(&mut self, state: &EmptyState) -> io::Result<()> {
        match &state.filename {
            Some(filename) => writeln!(self.out, "(nothing to show for {filename}: {})", state.reason)?,
            None => writeln!(self.out, "(nothing to show: {})", state.reason)?,
        }
        if !state.top_level_fields.is_empty() {
            writeln!(
                self.out,
                "  top-level fields: {}",
                state.top_level_fields.join(", ")
            )?;
        }
        Ok(())
    }
}

impl<W: Write> Projector for TerminalProjector<W> {
    fn project(&mut self, event: RenderEvent) {
        if let Err(e) = self.write_event(&event).and_then(|()| self.out.flush()) {
            tracing::debug!("failed to write to terminal: {e}");
        }
    }
}

/// One JSON object per render event, for piping into other tools.
pub struct JsonLinesProjector<W> {
    out: W,
}

impl<W: Write> JsonLinesProjector<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Projector for JsonLinesProjector<W> {
    fn project(&mut self, event: RenderEvent) {
        let written = serde_json::to_writer(&mut self.out, &event)
            .map_err(io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::debug!("failed to write event: {e}");
        }
    }
}

/// Either projector, picked at runtime by `--json`.
pub enum Output<W> {
    Terminal(TerminalProjector<W>),
    Json(JsonLinesProjector<W>),
}

impl<W: Write> Output<W> {
    pub fn new(out: W, json: bool, verbose_controls: bool) -> Self {
        if json {
            Self::Json(JsonLinesProjector::new(out))
        } else {
            Self::Terminal(TerminalProjector::new(out).verbose_controls(verbose_controls))
        }
    }
}

impl<W: Write> Projector for Output<W> {
    fn project(&mut self, event: RenderEvent) {
        match self {
            Self::Terminal(p) => p.project(event),
            Self::Json(p) => p.project(event),
        }
    }
}

fn preview(content: &str) -> String {
    let single_line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= RESULT_PREVIEW_CHARS {
        return single_line;
    }
    let cut: String = single_line.chars().take(RESULT_PREVIEW_CHARS).collect();
    format!("{cut}…")
}
