//! Interactive viewer for landmark layouts.
//!
//! Run with: cargo run --features gui --bin layout-viewer -- [id]

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use eframe::egui;
use face_layout::{
    logging, normalize::open_image, plot::Plot, AppConfig, Layout, PhotoId, Point, Scheme,
    StorageConfig,
};
use log::warn;

#[derive(Parser, Debug)]
#[command(name = "layout-viewer")]
#[command(author, version, about = "Interactive facial landmark layout viewer", long_about = None)]
struct Args {
    /// Numeric photograph identifier to open on start
    #[arg(allow_hyphen_values = true)]
    id: Option<PhotoId>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            warn!("{e}; using defaults");
            AppConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };

    eframe::run_native(
        "face-layout - Layout Viewer",
        options,
        Box::new(move |_cc| {
            let mut app = ViewerApp::new(config.storage);
            if let Some(id) = args.id {
                app.open_id(id);
            }
            Ok(Box::new(app))
        }),
    )
}

struct ViewerApp {
    storage: StorageConfig,
    id_text: String,

    layout: Option<Layout>,
    layout_path: Option<PathBuf>,
    scheme: Option<Scheme>,
    plot: Option<Plot>,

    portrait: Option<egui::ColorImage>,
    portrait_texture: Option<egui::TextureHandle>,

    show_portrait: bool,
    show_markers: bool,
    show_contours: bool,
    show_labels: bool,

    status: String,
}

impl ViewerApp {
    fn new(storage: StorageConfig) -> Self {
        Self {
            storage,
            id_text: String::new(),
            layout: None,
            layout_path: None,
            scheme: None,
            plot: None,
            portrait: None,
            portrait_texture: None,
            show_portrait: true,
            show_markers: true,
            show_contours: true,
            show_labels: true,
            status: "Open a layout to begin".to_string(),
        }
    }

    fn open_id(&mut self, id: PhotoId) {
        self.id_text = id.to_string();
        let portrait = self.storage.portrait_path(id);
        self.open_layout(self.storage.layout_path(id), Some(portrait));
    }

    fn open_layout(&mut self, path: PathBuf, portrait: Option<PathBuf>) {
        match Layout::read(&path) {
            Ok(layout) => {
                self.scheme = Scheme::detect(layout.num_landmarks);
                self.status = format!(
                    "Loaded {} ({} points, {})",
                    path.display(),
                    layout.num_landmarks,
                    self.scheme
                        .map_or("no contour table".to_string(), |s| s.to_string())
                );
                self.layout = Some(layout);
                self.layout_path = Some(path);
                self.rebuild_plot();
            }
            Err(e) => {
                self.status = format!("Failed to load layout: {e}");
                return;
            }
        }

        self.portrait = None;
        self.portrait_texture = None;
        if let Some(path) = portrait.filter(|p| p.exists()) {
            match open_image(&path) {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    let size = [rgba.width() as usize, rgba.height() as usize];
                    self.portrait = Some(egui::ColorImage::from_rgba_unmultiplied(
                        size,
                        rgba.as_raw(),
                    ));
                }
                Err(e) => warn!("{e}"),
            }
        }
    }

    fn rebuild_plot(&mut self) {
        self.plot = self.layout.as_ref().map(|layout| {
            let contours = self.scheme.map_or(&[][..], |s| s.contours());
            Plot::build(layout, contours)
        });
    }

    fn draw_plot(&mut self, ui: &mut egui::Ui) {
        let Some(plot) = &self.plot else {
            ui.centered_and_justified(|ui| {
                ui.heading("Enter an id or use File > Open Layout");
            });
            return;
        };

        let available = ui.available_size();
        let scale = (available.x / plot.width as f32)
            .min(available.y / plot.height as f32)
            .max(0.01);
        let size = egui::vec2(plot.width as f32 * scale, plot.height as f32 * scale);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let origin = response.rect.min;
        let to_screen = |p: Point| origin + egui::vec2(p.x as f32 * scale, p.y as f32 * scale);

        if self.show_portrait {
            if let Some(image) = self.portrait.take() {
                self.portrait_texture =
                    Some(ui.ctx().load_texture("portrait", image, Default::default()));
            }
            if let Some(texture) = &self.portrait_texture {
                painter.image(
                    texture.id(),
                    response.rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
        } else {
            painter.rect_filled(response.rect, 0.0, egui::Color32::WHITE);
        }

        if self.show_contours {
            let stroke = egui::Stroke::new(1.5, egui::Color32::from_rgb(0, 160, 200));
            for line in &plot.polylines {
                let points: Vec<egui::Pos2> = line.points.iter().map(|p| to_screen(*p)).collect();
                painter.add(egui::Shape::line(points, stroke));
            }
        }

        if self.show_markers {
            let color = egui::Color32::from_rgb(220, 30, 30);
            for p in &plot.markers {
                painter.circle_filled(to_screen(*p), 1.5, color);
            }
        }

        if self.show_labels {
            let color = egui::Color32::from_rgb(20, 20, 20);
            for label in &plot.labels {
                let at = to_screen(label.at);
                painter.circle_stroke(at, 4.0, egui::Stroke::new(1.0, color));
                painter.text(
                    at + egui::vec2(6.0, -6.0),
                    egui::Align2::LEFT_BOTTOM,
                    label.text,
                    egui::FontId::proportional(14.0),
                    color,
                );
            }
        }

        if let Some(hover) = response.hover_pos() {
            let local = hover - origin;
            let p = Point::new((local.x / scale) as f64, (local.y / scale) as f64);
            if let Some(i) = plot.nearest_marker(p, 8.0 / scale as f64) {
                let m = plot.markers[i];
                painter.circle_stroke(
                    to_screen(m),
                    5.0,
                    egui::Stroke::new(2.0, egui::Color32::YELLOW),
                );
                response.on_hover_text(format!("#{i} ({:.1}, {:.1})", m.x, m.y));
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("menu").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Layout...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Layout", &["json"])
                            .pick_file()
                        {
                            self.open_layout(path, None);
                        }
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::SidePanel::left("controls").min_width(220.0).show(ctx, |ui| {
            ui.heading("Layout");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Id:");
                ui.text_edit_singleline(&mut self.id_text);
            });
            if ui.button("Open").clicked() {
                match self.id_text.trim().parse::<PhotoId>() {
                    Ok(id) => self.open_id(id),
                    Err(e) => self.status = e,
                }
            }
            ui.add_space(16.0);

            ui.heading("Scheme");
            ui.separator();
            let mut scheme = self.scheme;
            ui.radio_value(&mut scheme, None, "markers only");
            for s in Scheme::ALL {
                ui.radio_value(&mut scheme, Some(s), s.to_string());
            }
            if scheme != self.scheme {
                self.scheme = scheme;
                self.rebuild_plot();
            }
            ui.add_space(16.0);

            ui.heading("Show");
            ui.separator();
            ui.checkbox(&mut self.show_portrait, "Portrait");
            ui.checkbox(&mut self.show_markers, "Markers");
            ui.checkbox(&mut self.show_contours, "Contours");
            ui.checkbox(&mut self.show_labels, "Labels");
            ui.add_space(16.0);

            ui.heading("Status");
            ui.separator();
            ui.label(&self.status);
            if let Some(plot) = &self.plot {
                if plot.skipped > 0 {
                    ui.label(format!("{} contour indices skipped", plot.skipped));
                }
                ui.add_space(8.0);
                for label in &plot.labels {
                    ui.label(format!("  {} ({:.0}, {:.0})", label.text, label.at.x, label.at.y));
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_plot(ui);
        });

        // Handle drag and drop
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if let Some(path) = dropped.into_iter().next() {
            self.open_layout(path, None);
        }
    }
}
