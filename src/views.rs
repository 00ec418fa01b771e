use iced::{
    alignment,
    widget::{
        button, checkbox, column, container, horizontal_rule, horizontal_space, row, scrollable, text,
        text_input, Column,
    },
    Color, Element, Font, Length,
};

use crate::auth::Identity;
use crate::chat::{ChatPhase, ChatPipeline};
use crate::form::{SourceKind, SourceSelection};
use crate::markdown::{self, Block};
use crate::models::{ChatMessage, Role};
use crate::navigator::AnswerView;
use crate::research::{ResearchController, StoredResult};
use crate::session::Session;
use crate::Message;

const ERROR_COLOR: Color = Color::from_rgb(0.95, 0.45, 0.45);
const MUTED_COLOR: Color = Color::from_rgb(0.6, 0.62, 0.7);
const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .align_x(alignment::Horizontal::Center)
        .align_y(alignment::Vertical::Center)
        .into()
}

pub fn home<'a>(identity: &Identity) -> Element<'a, Message> {
    let content = if identity.is_signed_in() {
        column![
            text("Welcome to Learning Assistant").size(36),
            button(text("Start Learning").size(18))
                .on_press(Message::StartNewResearch)
                .padding(12),
        ]
    } else {
        column![
            text("Ready to Explore?").size(32),
            text("Sign in with your identity provider, then continue.")
                .size(15)
                .color(MUTED_COLOR),
            button(text("Sign In to Get Started").size(18))
                .on_press(Message::SignIn)
                .padding(12),
        ]
    };

    centered(content.spacing(20).align_x(alignment::Horizontal::Center))
}

pub fn query<'a>(
    form: &'a SourceSelection,
    controller: &'a ResearchController,
    pdf_path: &'a str,
    pdf_error: Option<&'a str>,
    frame: usize,
) -> Element<'a, Message> {
    let pending = controller.is_pending();

    let mut prompt = text_input(
        "e.g. What are the latest breakthroughs in quantum computing?",
        form.prompt(),
    )
    .padding(12)
    .size(16);
    if !pending {
        prompt = prompt
            .on_input(Message::PromptChanged)
            .on_submit(Message::SubmitResearch);
    }

    let mut sources = Column::new().spacing(10);
    for kind in SourceKind::DISPLAY_ORDER {
        sources = sources.push(
            checkbox(kind.label(), form.is_enabled(kind))
                .on_toggle(move |enabled| Message::SourceToggled(kind, enabled)),
        );

        if kind == SourceKind::YouTube && form.is_enabled(kind) {
            sources = sources.push(
                container(
                    text_input("Paste YouTube video URL", form.youtube_url())
                        .on_input(Message::YoutubeUrlChanged)
                        .padding(8),
                )
                .padding([0, 28]),
            );
        }

        if kind == SourceKind::Pdf && form.is_enabled(kind) {
            let status: Element<'a, Message> = match (form.pdf_file(), pdf_error) {
                (_, Some(error)) => text(error).size(13).color(ERROR_COLOR).into(),
                (Some(file), None) => text(format!("Attached {} ({} bytes)", file.file_name(), file.size_bytes()))
                    .size(13)
                    .color(MUTED_COLOR)
                    .into(),
                (None, None) => text("No document attached").size(13).color(MUTED_COLOR).into(),
            };

            sources = sources.push(
                container(
                    column![
                        row![
                            text_input("Path to a .pdf file", pdf_path)
                                .on_input(Message::PdfPathChanged)
                                .on_submit(Message::AttachPdf)
                                .padding(8),
                            button(text("Attach")).on_press(Message::AttachPdf).padding(8),
                        ]
                        .spacing(8),
                        status,
                    ]
                    .spacing(6),
                )
                .padding([0, 28]),
            );
        }
    }

    let submit_label = if pending {
        format!("{} Researching...", spinner(frame))
    } else {
        "Start Research".to_string()
    };
    let submit = button(text(submit_label).size(16))
        .on_press_maybe((!pending).then_some(Message::SubmitResearch))
        .padding(12)
        .width(Length::Fill);

    let mut content = column![
        text("Unified Multi-Source Research Assistant").size(28),
        text("Enter your Research Topic or Question").size(14),
        prompt,
        text("Select Sources").size(18),
        sources,
        submit,
    ]
    .spacing(14)
    .padding(30)
    .max_width(760);

    let error = controller
        .form_error()
        .map(|error| error.to_string())
        .or_else(|| controller.error().map(str::to_string));
    if let Some(error) = error {
        content = content.push(text(format!("⚠ {}", error)).size(14).color(ERROR_COLOR));
    }

    scrollable(
        container(content)
            .width(Length::Fill)
            .align_x(alignment::Horizontal::Center),
    )
    .height(Length::Fill)
    .into()
}

pub fn answer<'a>(session: &'a Session, frame: usize) -> Element<'a, Message> {
    match session.answer_view() {
        AnswerView::Generating => centered(
            column![
                text(spinner(frame)).size(32),
                text("Generating your unified summary... Please wait.").size(16),
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center),
        ),
        AnswerView::NoResult => centered(
            column![
                text("No Result Found").size(28).color(ERROR_COLOR),
                text("We couldn't retrieve a result. Please try your query again.")
                    .size(15)
                    .color(MUTED_COLOR),
                button(text("Start New Research")).on_press(Message::StartOver).padding(10),
            ]
            .spacing(16)
            .align_x(alignment::Horizontal::Center),
        ),
        AnswerView::Ready(stored) => {
            let conversation: Element<'a, Message> = match session.chat() {
                Some(chat) => chat_pane(chat, frame),
                None => horizontal_space().into(),
            };

            row![
                container(summary_pane(stored))
                    .width(Length::FillPortion(2))
                    .height(Length::Fill),
                container(conversation)
                    .width(Length::FillPortion(1))
                    .height(Length::Fill)
                    .padding(16),
            ]
            .spacing(10)
            .height(Length::Fill)
            .into()
        }
    }
}

fn summary_pane(stored: &StoredResult) -> Element<'_, Message> {
    let mut blocks = Column::new().spacing(10);
    for block in markdown::summary_blocks(&stored.result().summary) {
        blocks = blocks.push(render_block(block));
    }

    let actions = row![
        button(text("Start New Research"))
            .on_press(Message::StartNewResearch)
            .padding(10),
        button(text("[Copy]").size(14)).on_press(Message::CopySummary).padding(10),
    ]
    .spacing(10);

    scrollable(
        column![text("Your Unified Summary").size(28), blocks, actions]
            .spacing(18)
            .padding(24),
    )
    .height(Length::Fill)
    .into()
}

fn render_block(block: Block) -> Element<'static, Message> {
    match block {
        Block::Heading { level, text: heading } => {
            let size = match level {
                1 => 26,
                2 => 22,
                3 => 19,
                _ => 17,
            };
            text(heading).size(size).into()
        }
        Block::Paragraph(body) => text(body).size(15).into(),
        Block::ListItem { depth, marker, text: body } => row![
            horizontal_space().width(Length::Fixed(18.0 * depth as f32)),
            text(marker).size(15),
            text(body).size(15),
        ]
        .spacing(6)
        .into(),
        Block::Quote(body) => container(text(body).size(15).color(MUTED_COLOR))
            .padding([4, 16])
            .into(),
        Block::Code(code) => container(text(code).size(13).font(Font::MONOSPACE))
            .padding(10)
            .style(container::rounded_box)
            .width(Length::Fill)
            .into(),
        Block::Rule => horizontal_rule(1).into(),
    }
}

fn chat_bubble(message: &ChatMessage) -> Element<'_, Message> {
    let bubble = container(text(message.content()).size(14))
        .padding(10)
        .max_width(420)
        .style(container::rounded_box);

    match message.role() {
        Role::Human => row![horizontal_space(), bubble].into(),
        Role::Assistant => row![bubble, horizontal_space()].into(),
    }
}

fn chat_pane(chat: &ChatPipeline, frame: usize) -> Element<'_, Message> {
    let state = chat.state();
    let sending = chat.phase() == ChatPhase::Sending;

    let mut history = Column::new().spacing(10).padding(8);
    for message in state.displayed_history() {
        history = history.push(chat_bubble(message));
    }
    if sending {
        history = history.push(
            text(format!("{} Assistant is typing...", spinner(frame)))
                .size(13)
                .color(MUTED_COLOR),
        );
    }
    if let Some(error) = state.last_error() {
        history = history.push(text(format!("Error: {}", error)).size(13).color(ERROR_COLOR));
    }

    let mut input = text_input("Ask something...", state.pending_input()).padding(10);
    if !sending {
        input = input
            .on_input(Message::ChatInputChanged)
            .on_submit(Message::SendChat);
    }
    let send = button(text("Send"))
        .on_press_maybe((!sending).then_some(Message::SendChat))
        .padding(10);

    column![
        text("Chat with the Assistant").size(20),
        text("Ask follow-up questions about the summary.")
            .size(13)
            .color(MUTED_COLOR),
        scrollable(history).height(Length::Fill),
        row![input, send].spacing(8),
    ]
    .spacing(10)
    .into()
}
