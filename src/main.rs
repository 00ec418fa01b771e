mod api;
mod auth;
mod chat;
mod config;
mod conversation;
mod form;
mod logging;
mod markdown;
mod models;
mod navigator;
mod research;
mod session;
mod views;

use iced::{
    clipboard,
    event::{self, Event as IcedEvent},
    keyboard::{self, Key},
    time, window, Element, Subscription, Task, Theme,
};
use std::path::PathBuf;
use std::time::Duration;

use api::{RequestFailure, ResearchClient};
use auth::Identity;
use config::{AuthConfig, Config};
use form::{FormField, PdfAttachment, SourceKind, Submission};
use models::{ChatMessage, ResearchResult};
use navigator::{AnswerView, Route};
use research::{RequestTicket, ResultId};
use session::Session;

fn main() -> iced::Result {
    logging::init_tracing();
    let config = Config::load();
    tracing::debug!(?config, "Loaded configuration");

    let window = window::Settings {
        size: iced::Size::new(config.window.width as f32, config.window.height as f32),
        min_size: Some(iced::Size::new(
            config.window.min_width as f32,
            config.window.min_height as f32,
        )),
        position: window::Position::Centered,
        ..Default::default()
    };

    iced::application("Learning Assistant", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window)
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone)]
pub enum Message {
    SignIn,
    PromptChanged(String),
    SourceToggled(SourceKind, bool),
    YoutubeUrlChanged(String),
    PdfPathChanged(String),
    AttachPdf,
    PdfLoaded(Result<PdfAttachment, String>),
    SubmitResearch,
    ResearchFinished(RequestTicket, Result<ResearchResult, RequestFailure>),
    ChatInputChanged(String),
    SendChat,
    ChatFinished(ResultId, Result<ChatMessage, RequestFailure>),
    StartNewResearch,
    StartOver,
    CopySummary,
    Tick,
    Exit,
}

struct App {
    session: Session,
    client: ResearchClient,
    auth: AuthConfig,
    pdf_path: String,
    pdf_error: Option<String>,
    loading_frame: usize,
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        let identity = Identity::from_config(&config.auth);
        tracing::info!(
            backend = %config.backend.base_url,
            signed_in = identity.is_signed_in(),
            "Starting learning assistant"
        );

        let app = App {
            session: Session::new(),
            client: ResearchClient::with_config(&config.backend, identity),
            auth: config.auth,
            pdf_path: String::new(),
            pdf_error: None,
            loading_frame: 0,
        };

        (app, Task::none())
    }

    fn is_busy(&self) -> bool {
        self.session.controller().is_pending()
            || self
                .session
                .chat()
                .is_some_and(|chat| chat.state().is_sending())
    }

    fn clear_form_inputs(&mut self) {
        self.pdf_path.clear();
        self.pdf_error = None;
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SignIn => {
                let identity = Identity::from_config(&self.auth);
                if !identity.is_signed_in() {
                    tracing::warn!("Sign-in did not produce a token");
                }
                let signed_in = identity.is_signed_in();
                self.client.set_identity(identity);
                if signed_in {
                    self.clear_form_inputs();
                    self.session.navigate(Route::Query);
                }
                Task::none()
            }
            Message::PromptChanged(prompt) => {
                self.session.update_field(FormField::Prompt(prompt));
                Task::none()
            }
            Message::SourceToggled(kind, enabled) => {
                self.session.update_field(FormField::Source { kind, enabled });
                Task::none()
            }
            Message::YoutubeUrlChanged(url) => {
                self.session.update_field(FormField::YoutubeUrl(url));
                Task::none()
            }
            Message::PdfPathChanged(path) => {
                self.pdf_path = path;
                Task::none()
            }
            Message::AttachPdf => {
                let path = self.pdf_path.trim();
                if path.is_empty() {
                    self.pdf_error = Some("Enter the path of a .pdf file first.".to_string());
                    return Task::none();
                }

                let path = PathBuf::from(path);
                Task::perform(
                    async move {
                        PdfAttachment::from_path(&path)
                            .await
                            .map_err(|e| format!("{:#}", e))
                    },
                    Message::PdfLoaded,
                )
            }
            Message::PdfLoaded(Ok(attachment)) => {
                tracing::debug!(?attachment, "PDF attached");
                self.pdf_error = None;
                self.session.update_field(FormField::PdfFile(Some(attachment)));
                Task::none()
            }
            Message::PdfLoaded(Err(error)) => {
                self.pdf_error = Some(error);
                self.session.update_field(FormField::PdfFile(None));
                Task::none()
            }
            Message::SubmitResearch => {
                let Some(Submission { ticket, request }) = self.session.submit_research() else {
                    return Task::none();
                };

                let client = self.client.clone();
                Task::perform(
                    async move {
                        let outcome = client.research(&request).await;
                        (ticket, outcome)
                    },
                    |(ticket, outcome)| Message::ResearchFinished(ticket, outcome),
                )
            }
            Message::ResearchFinished(ticket, outcome) => {
                self.session.finish_research(ticket, outcome);
                Task::none()
            }
            Message::ChatInputChanged(input) => {
                self.session.set_chat_input(input);
                Task::none()
            }
            Message::SendChat => {
                let Some(outbound) = self.session.send_chat() else {
                    return Task::none();
                };

                let client = self.client.clone();
                let origin = outbound.origin;
                Task::perform(
                    async move { client.chat(&outbound.history).await },
                    move |outcome| Message::ChatFinished(origin, outcome),
                )
            }
            Message::ChatFinished(origin, outcome) => {
                self.session.finish_chat(origin, outcome);
                Task::none()
            }
            Message::StartNewResearch => {
                self.clear_form_inputs();
                self.session.start_new_research();
                Task::none()
            }
            Message::StartOver => {
                self.clear_form_inputs();
                self.session.start_over();
                Task::none()
            }
            Message::CopySummary => match self.session.answer_view() {
                AnswerView::Ready(stored) => clipboard::write(stored.result().summary.clone()),
                _ => Task::none(),
            },
            Message::Tick => {
                if self.is_busy() {
                    self.loading_frame = (self.loading_frame + 1) % 80;
                }
                Task::none()
            }
            Message::Exit => iced::exit(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Exit)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        match self.session.route() {
            Route::Home => views::home(self.client.identity()),
            Route::Query => match self.session.form() {
                Some(form) => views::query(
                    form,
                    self.session.controller(),
                    &self.pdf_path,
                    self.pdf_error.as_deref(),
                    self.loading_frame,
                ),
                None => views::home(self.client.identity()),
            },
            Route::Answer => views::answer(&self.session, self.loading_frame),
        }
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}
