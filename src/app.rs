use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::config::TimelineConfig;
use crate::io;
use crate::model::{
    Deliverable, ItemKind, ItemRef, ItemStatus, Milestone, Phase, Project, ProjectConfig,
    ProjectSnapshot, Workstream,
};
use crate::state::TimelineState;
use crate::store::{InMemoryStore, TimelineStore};
use crate::ui;

/// Main application state.
pub struct TimelineApp {
    pub state: TimelineState,
    pub store: InMemoryStore,
    pub config: TimelineConfig,
    pub project_path: Option<PathBuf>,
    pub status_message: String,
}

impl TimelineApp {
    pub fn new(project: Project, project_path: Option<PathBuf>, config: TimelineConfig) -> Self {
        let latency = Duration::from_millis(config.store_latency_ms);
        let store = InMemoryStore::new(project, latency);
        let snapshot = match store.fetch() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("initial fetch failed: {err}");
                ProjectSnapshot::new(0, store.project())
            }
        };
        let status_message = format!(
            "Loaded '{}': {} phases, {} milestones",
            snapshot.project.name,
            snapshot.project.phases.len(),
            snapshot.project.milestones.len()
        );

        Self {
            state: TimelineState::new(snapshot),
            store,
            config,
            project_path,
            status_message,
        }
    }

    /// A small portfolio anchored on `today` so the today marker is visible.
    pub fn sample_project(today: NaiveDate) -> Project {
        let day = |offset: i64| today + chrono::Duration::days(offset);

        let mut project = Project::new("Portfolio 2025");
        project.config = ProjectConfig::from_dates(day(-45), day(150));

        let mut platform = Workstream::new("Platform");
        platform.color_hint = Some("#4285f4".into());
        let mobile = Workstream::new("Mobile");
        let mut data = Workstream::new("Data");
        data.color_hint = Some("#34a853".into());
        let (platform_id, mobile_id, data_id) = (platform.id, mobile.id, data.id);
        project.workstreams = vec![platform, mobile, data];

        let mut discovery = Phase::new("Discovery", day(-40), day(-5));
        discovery.status = ItemStatus::Completed;
        let mut build = Phase::new("Build", day(-10), day(70));
        build.status = ItemStatus::InProgress;
        let launch = Phase::new("Launch", day(65), day(120));
        project.phases = vec![discovery, build, launch];

        let deliverable = |name: &str, start: i64, end: i64, stream: Option<uuid::Uuid>| {
            let mut d = Deliverable::new(name, day(start), day(end));
            d.workstream_id = stream;
            d
        };

        let mut alpha = Milestone::new("Alpha", day(20));
        alpha.workstream_id = Some(platform_id);
        alpha.deliverables = vec![
            deliverable("Auth service", -20, 10, Some(platform_id)),
            deliverable("API gateway", -5, 18, Some(platform_id)),
            deliverable("iOS shell", 0, 25, Some(mobile_id)),
            deliverable("Event pipeline", -15, 5, Some(data_id)),
        ];

        let mut beta = Milestone::new("Beta", day(60));
        beta.workstream_id = Some(mobile_id);
        beta.deliverables = vec![
            deliverable("Billing", 22, 55, Some(platform_id)),
            deliverable("Android shell", 10, 50, Some(mobile_id)),
            deliverable("Offline sync", 30, 58, Some(mobile_id)),
            deliverable("Dashboards", 8, 40, Some(data_id)),
            deliverable("Security review", 40, 52, None),
        ];

        let mut ga = Milestone::new("General availability", day(110));
        ga.workstream_id = Some(platform_id);
        ga.deliverables = vec![
            deliverable("Load testing", 70, 90, Some(platform_id)),
            deliverable("Store listing", 85, 105, Some(mobile_id)),
        ];

        // Undated: listed in the project but never drawn as a bar.
        let mut retro = Milestone::new("Retrospective", day(130));
        retro.date = None;
        retro.deliverables = vec![Deliverable {
            start_date: None,
            ..deliverable("Lessons learned", 125, 135, Some(data_id))
        }];

        project.milestones = vec![alpha, beta, ga, retro];
        project
    }

    pub fn refresh(&mut self) {
        match self.state.refresh(&self.store) {
            Ok(()) => self.status_message = format!("Refreshed (revision {})", self.state.revision()),
            Err(err) => self.status_message = format!("Refresh failed: {err}"),
        }
    }

    /// Write the store's authoritative project back to the file it came from.
    pub fn save_project(&mut self) {
        let Some(path) = self.project_path.clone() else {
            self.status_message = "No project file to save to (start with --project)".into();
            return;
        };
        match io::save_project(&self.store.project(), &path) {
            Ok(()) => {
                tracing::info!("saved project to {}", path.display());
                self.status_message = format!("Saved: {}", path.display());
            }
            Err(err) => {
                tracing::warn!("{err}");
                self.status_message = format!("Save failed: {err}");
            }
        }
    }

    /// Human-readable name for an item, for the status bar.
    fn describe(&self, item: ItemRef) -> String {
        let project = self.state.project();
        let name = match item {
            ItemRef::Phase(id) => project.phase(id).map(|p| p.name.clone()),
            ItemRef::Milestone(id) => project.milestone(id).map(|m| m.name.clone()),
            ItemRef::Deliverable {
                milestone_id,
                deliverable_id,
            } => project
                .deliverable(milestone_id, deliverable_id)
                .map(|d| d.name.clone()),
        }
        .unwrap_or_else(|| "(removed)".into());
        let kind = match item.kind() {
            ItemKind::Phase => "phase",
            ItemKind::Milestone => "milestone",
            ItemKind::Deliverable => "deliverable",
        };
        format!("{kind} '{name}'")
    }

    fn workstream_of(&self, item: ItemRef) -> Option<String> {
        let project = self.state.project();
        let stream = match item {
            ItemRef::Phase(_) => None,
            ItemRef::Milestone(id) => project.milestone(id)?.workstream_id,
            ItemRef::Deliverable {
                milestone_id,
                deliverable_id,
            } => project.deliverable(milestone_id, deliverable_id)?.workstream_id,
        }?;
        project.workstream(stream).map(|ws| ws.name.clone())
    }
}

impl eframe::App for TimelineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ui::theme::apply_theme(ctx);

        for save in self.state.poll(&self.store) {
            if let Err(err) = save.result {
                self.status_message = format!("Could not save {}: {err}", self.describe(save.item));
            }
        }
        if self.state.in_flight_count() > 0 {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::S)) {
            self.save_project();
        }

        // Top panel: toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(&self.state.project().name);
                ui.separator();
                if ui.button("⟳ Refresh").on_hover_text("Refetch the project").clicked() {
                    self.refresh();
                }
                let can_save = self.project_path.is_some();
                if ui
                    .add_enabled(can_save, egui::Button::new("💾 Save"))
                    .on_hover_text("Write the project file (Ctrl+S)")
                    .clicked()
                {
                    self.save_project();
                }
            });
        });

        // Bottom panel: status bar
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(24.0)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_small())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let saving = self.state.in_flight_count();
                        let text = if saving > 0 {
                            format!("Saving {saving}… · rev {}", self.state.revision())
                        } else {
                            format!("rev {}", self.state.revision())
                        };
                        ui.label(
                            egui::RichText::new(text)
                                .font(ui::theme::font_small())
                                .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        // Central panel: timeline
        let interaction = egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(ui::theme::BG_DARK))
            .show(ctx, |ui| {
                ui::timeline_view::show_timeline(&mut self.state, &self.store, &self.config, ui)
            })
            .inner;

        if let Some(commit) = interaction.commit {
            let what = self.describe(commit.target);
            self.status_message = if commit.is_noop() {
                format!("Saving {what} (dates unchanged)")
            } else {
                format!(
                    "Saving {what}: {} → {}",
                    commit.bounds.start_date().format("%d/%m/%Y"),
                    commit.bounds.end_date().format("%d/%m/%Y"),
                )
            };
        }
        if let Some(item) = interaction.edit_requested {
            tracing::info!(?item, "edit requested");
            let what = self.describe(item);
            self.status_message = match self.workstream_of(item) {
                Some(stream) => format!("Edit {what} in {stream}"),
                None => format!("Edit {what}"),
            };
        }
    }
}
