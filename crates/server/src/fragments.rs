use maud::{html, Markup, DOCTYPE};
use storage::StoredItem;

/// Full page shell. Carries the two fixed elements the send-error script
/// toggles (`#gray-out-page`, `#htmx-send-error`), both hidden until a
/// request fails.
pub fn page(title: &str, content: Markup) -> Markup {
    fn head(page_title: &str) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en";
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                // utility-CSS engine; must be installed before any markup renders
                script type="module" src="/twind.js" {}
                link rel="stylesheet" type="text/css" href="/style.css";
                title { "orderboard - " (page_title) }
            }
        }
    }

    fn header() -> Markup {
        html! {
            header ."container flex mx-auto" {
                nav ."column p-6" {
                    a href="/" ."p-6 text-primary" { "Home" }
                }
                ."p-6" {
                    img src="/favicon.ico" style="image-rendering: pixelated;" alt="orderboard logo";
                }
            }
        }
    }

    fn footer() -> Markup {
        html! {
            footer ."flex max-w-lg mx-auto justify-around" {
                div ."container" {
                    p { "orderboard" }
                }
            }
            script src="https://unpkg.com/htmx.org@1.9.4" {};
            script src="https://unpkg.com/sortablejs@1.15.0/Sortable.min.js" {};
            script src="/script.js" {};
        }
    }

    html! {
        (head(title))
        body style="position: relative;" {
            div #"gray-out-page" .hidden {
                button ."bg-primary-btn text-white rounded p-2" hx-get="/" hx-target="body" hx-swap="outerHTML" { "Reload" }
            }
            div #"htmx-send-error" .hidden {
                "Error sending the request"
            }
            (header())

            main ."container mx-auto" {
                (content)
            }
            (footer())
        }
    }
}

pub fn not_found_page() -> Markup {
    page(
        "PAGE NOT FOUND",
        html! {
            h2 { "This page does not exist. Sorry!" }
            p {
                a href="/" { "Return to the main page" }
            }
        },
    )
}

/// Creation form plus the sortable list, wrapped in the element fragment
/// responses replace wholesale.
pub fn items_panel(dom_id: &str, items: &[StoredItem]) -> Markup {
    html! {
        div #(dom_id) {
            form ."items-new flex" hx-post="/item" hx-target={ "#"(dom_id) } hx-swap="outerHTML" {
                input ."border rounded m-1 p-1 w-full" type="text" name="title" placeholder="Title..." value="" autocomplete="off" {}
                input ."border rounded m-1 p-1 w-full" type="text" name="body" placeholder="Body..." value="" autocomplete="off" {}
                input ."hidden" type="submit" {}
            }

            (sortable_list(items))
        }
    }
}

/// The drag-and-drop container. The `changed` event is dispatched by the
/// sortable script after a drop, with the neighbor ids in `hx-vals`.
pub fn sortable_list(items: &[StoredItem]) -> Markup {
    html! {
        div hx-post="/item/order" hx-trigger="changed" hx-swap="none" {
            div ."htmx-indicator" { "Updating..." }
            div ."sortable border-1 border-solid rounded-sm divide-y divide-solid" {
                @for item in items {
                    (item_row(item))
                }
            }
        }
    }
}

pub fn item_row(item: &StoredItem) -> Markup {
    html! {
        div ."draggable container p-1 even:bg-slate-50" #(item.id) {
            span .handle { "<>" } " ";
            a href={ "/item/" (item.id) "/edit" } hx-trigger="click" hx-get={ "/item/" (item.id) "/edit" } hx-target="#item-edit" hx-swap="outerHTML" {
                (item.title)
            }
        }
    }
}

/// Placeholder the edit fragment swaps into.
pub fn edit_slot() -> Markup {
    html! {
        form #"item-edit" ."p-1" {
        }
    }
}

pub fn edit_form(item: &StoredItem) -> Markup {
    html! {
        form #"item-edit" ."p-1" hx-post={ "/item/" (item.id) } hx-target="#items" hx-swap="outerHTML" {
            input type="text" name="title" placeholder="Title..." ."border rounded p-1 m-1 w-full" value=(item.title);
            textarea name="body" placeholder="Body..." ."border rounded p-1 m-1 w-full h-24" { (item.body) }
            button type="submit" ."bg-primary-btn text-white rounded p-1 m-1" { "Save" }
        }
    }
}
