//! Anchor rewriting and interaction overrides.

use crate::stats::EngineStats;
use lf_core::RedirectResult;
use lf_dom::AnchorHandle;
use lf_dom::Disposition;
use lf_dom::HrefContract;
use lf_dom::InteractionEvent;
use lf_dom::InteractionHandler;
use lf_dom::InteractionKind;
use lf_dom::Modifiers;
use lf_dom::PageHost;
use lf_dom::PointerButton;
use lf_url::Normalizer;
use std::rc::Rc;

/// Converts short-form anchors in place, once per element.
pub struct LinkRewriter<P: PageHost> {
    page: Rc<P>,
    normalizer: Rc<Normalizer>,
    stats: Rc<EngineStats>,
}

impl<P: PageHost> LinkRewriter<P> {
    pub fn new(page: Rc<P>, normalizer: Rc<Normalizer>, stats: Rc<EngineStats>) -> Self {
        Self {
            page,
            normalizer,
            stats,
        }
    }

    /// One pass over every anchor mentioning the marker. Already converted
    /// anchors are skipped; a failing anchor is left for the next pass.
    pub fn scan(&self) -> RedirectResult<usize> {
        let anchors = self
            .page
            .anchors_mentioning(self.normalizer.marker_needle())?;

        let mut converted = 0_usize;
        for anchor in anchors {
            if anchor.is_converted() {
                continue;
            }
            if let Some(true) = self.stats.absorb("anchor conversion", self.convert(&anchor)) {
                converted = converted.saturating_add(1);
            }
        }

        self.stats.record_scan(converted);
        if converted > 0 {
            log::debug!("converted {converted} short-form anchors");
        }
        Ok(converted)
    }

    /// Converts one anchor; returns false when its target is absent or not
    /// short-form.
    pub fn convert(&self, anchor: &P::Anchor) -> RedirectResult<bool> {
        let Some(href) = anchor.href()? else {
            return Ok(false);
        };
        let Some(canonical) = self.normalizer.canonicalize(&href) else {
            return Ok(false);
        };

        anchor.install_href_contract(HrefContract::new(Rc::clone(&self.normalizer)))?;
        anchor.set_href_attribute(canonical.as_str())?;

        let fallback: Rc<str> = Rc::from(canonical.as_str());
        for kind in InteractionKind::ALL {
            anchor.add_capture_listener(kind, self.handler(kind, anchor, &fallback))?;
        }

        anchor.mark_converted()?;
        Ok(true)
    }

    fn handler(
        &self,
        kind: InteractionKind,
        anchor: &P::Anchor,
        fallback: &Rc<str>,
    ) -> InteractionHandler {
        let page = Rc::clone(&self.page);
        let normalizer = Rc::clone(&self.normalizer);
        let stats = Rc::clone(&self.stats);
        let anchor = anchor.clone();
        let fallback = Rc::clone(fallback);

        Rc::new(move |event: &dyn InteractionEvent| {
            let target = current_target(&anchor, &normalizer, &fallback);
            let result = match kind {
                InteractionKind::Click => follow_click(page.as_ref(), &target, event),
                InteractionKind::PressDown | InteractionKind::ContextMenu => {
                    anchor.set_href_attribute(&target)
                }
            };
            stats.absorb(kind.as_event_type(), result);
        })
    }
}

/// New-context disposition for a click, `None` for a same-context follow.
pub fn new_context_disposition(button: PointerButton, modifiers: Modifiers) -> Option<Disposition> {
    if button == PointerButton::Auxiliary || modifiers.ctrl || modifiers.meta {
        Some(Disposition::BackgroundTab)
    } else if modifiers.shift {
        Some(Disposition::ForegroundTab)
    } else {
        None
    }
}

// Read at event time: the host may have recycled the element for another id.
fn current_target<A: AnchorHandle>(anchor: &A, normalizer: &Normalizer, fallback: &str) -> String {
    match anchor.href() {
        Ok(Some(href)) => normalizer.normalize(&href).into_owned(),
        _ => fallback.to_owned(),
    }
}

fn follow_click<P: PageHost>(
    page: &P,
    target: &str,
    event: &dyn InteractionEvent,
) -> RedirectResult<()> {
    let button = event.button();
    if !matches!(button, PointerButton::Primary | PointerButton::Auxiliary) {
        return Ok(());
    }

    // Suppress before acting so a failed open can never fall through to the
    // host's navigation to the short-form target.
    event.suppress();
    match new_context_disposition(button, event.modifiers()) {
        Some(disposition) => page.open_new_context(target, disposition),
        None => page.assign_location(target),
    }
}

#[cfg(test)]
mod tests {
    use super::LinkRewriter;
    use super::new_context_disposition;
    use crate::stats::EngineStats;
    use lf_dom::AnchorHandle;
    use lf_dom::Disposition;
    use lf_dom::DispatchOutcome;
    use lf_dom::InteractionKind;
    use lf_dom::MemoryPage;
    use lf_dom::Modifiers;
    use lf_dom::Navigation;
    use lf_dom::PointerButton;
    use lf_url::Normalizer;
    use std::rc::Rc;

    fn rewriter(page: &MemoryPage) -> (LinkRewriter<MemoryPage>, Rc<EngineStats>) {
        let stats = Rc::new(EngineStats::default());
        let rewriter = LinkRewriter::new(
            Rc::new(page.clone()),
            Rc::new(Normalizer::default()),
            Rc::clone(&stats),
        );
        (rewriter, stats)
    }

    fn scan(rewriter: &LinkRewriter<MemoryPage>) -> usize {
        match rewriter.scan() {
            Ok(converted) => converted,
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn rewrites_attribute_and_marks_anchor() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);

        assert_eq!(scan(&rewriter), 1);
        assert_eq!(anchor.attribute().as_deref(), Some("https://host/watch?v=abc"));
        assert!(anchor.is_converted());
        assert!(anchor.has_contract());
        assert_eq!(anchor.listener_count(), 3);
    }

    #[test]
    fn second_pass_converts_nothing() {
        let page = MemoryPage::new("https://host/");
        let first = page.add_anchor("https://host/shorts/a");
        let second = page.add_anchor("https://host/shorts/b?t=4");
        let (rewriter, stats) = rewriter(&page);

        assert_eq!(scan(&rewriter), 2);
        assert_eq!(scan(&rewriter), 0);
        assert_eq!(first.listener_count(), 3);
        assert_eq!(second.listener_count(), 3);
        assert_eq!(stats.snapshot().anchors_converted, 2);
        assert_eq!(stats.snapshot().scans, 2);
    }

    #[test]
    fn ignores_anchors_without_short_form_targets() {
        let page = MemoryPage::new("https://host/");
        let watch = page.add_anchor("https://host/watch?v=abc");
        let channel = page.add_anchor("https://host/@someone/shorts/");
        let empty = page.add_anchor_without_href();
        let (rewriter, _) = rewriter(&page);

        assert_eq!(scan(&rewriter), 0);
        assert!(!watch.is_converted());
        assert!(!channel.is_converted());
        assert!(!empty.is_converted());
    }

    #[test]
    fn restricted_anchor_is_skipped_without_failing_the_pass() {
        let page = MemoryPage::new("https://host/");
        let blocked = page.add_anchor("https://host/shorts/blocked");
        let open = page.add_anchor("https://host/shorts/open");
        page.restrict(&blocked);
        let (rewriter, stats) = rewriter(&page);

        assert_eq!(scan(&rewriter), 1);
        assert!(!blocked.is_converted());
        assert!(open.is_converted());
        assert_eq!(stats.snapshot().absorbed_failures, 1);
    }

    #[test]
    fn host_property_writes_are_normalized() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        page.host_assign_href(&anchor, "https://host/shorts/def?t=7");
        assert_eq!(
            anchor.attribute().as_deref(),
            Some("https://host/watch?v=def&t=7")
        );
    }

    #[test]
    fn reads_stay_canonical_after_host_set_attribute() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        page.host_set_attribute(&anchor, "https://host/shorts/zzz");
        let read = match anchor.href() {
            Ok(read) => read,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(read.as_deref(), Some("https://host/watch?v=zzz"));
    }

    #[test]
    fn click_never_reaches_short_form_target() {
        let page = MemoryPage::new("https://host/");
        page.enable_host_click_routing();
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        // The host re-renders the attribute right before the click.
        page.host_set_attribute(&anchor, "https://host/shorts/abc");
        let outcome = page.dispatch(
            &anchor,
            InteractionKind::Click,
            PointerButton::Primary,
            Modifiers::none(),
        );

        assert_eq!(outcome, DispatchOutcome::Suppressed);
        assert_eq!(
            page.navigations(),
            vec![Navigation::Assign("https://host/watch?v=abc".to_owned())]
        );
        assert!(
            page.navigations()
                .iter()
                .all(|navigation| !navigation.href().is_some_and(|href| href.contains("/shorts/")))
        );
    }

    #[test]
    fn modifier_clicks_open_canonical_target_in_new_context() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        page.dispatch(
            &anchor,
            InteractionKind::Click,
            PointerButton::Primary,
            Modifiers::ctrl(),
        );
        page.dispatch(
            &anchor,
            InteractionKind::Click,
            PointerButton::Primary,
            Modifiers::shift(),
        );

        assert_eq!(
            page.navigations(),
            vec![
                Navigation::Open {
                    href: "https://host/watch?v=abc".to_owned(),
                    disposition: Disposition::BackgroundTab,
                },
                Navigation::Open {
                    href: "https://host/watch?v=abc".to_owned(),
                    disposition: Disposition::ForegroundTab,
                },
            ]
        );
        assert_eq!(page.current_location(), "https://host/");
    }

    #[test]
    fn middle_press_reasserts_attribute_before_native_open() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        page.host_set_attribute(&anchor, "https://host/shorts/abc");
        let outcome = page.dispatch(
            &anchor,
            InteractionKind::PressDown,
            PointerButton::Auxiliary,
            Modifiers::none(),
        );

        assert_eq!(outcome, DispatchOutcome::Default);
        assert_eq!(
            page.navigations(),
            vec![Navigation::Open {
                href: "https://host/watch?v=abc".to_owned(),
                disposition: Disposition::BackgroundTab,
            }]
        );
    }

    #[test]
    fn context_menu_reasserts_attribute() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/abc");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        page.host_set_attribute(&anchor, "https://host/shorts/abc#t=3");
        page.dispatch(
            &anchor,
            InteractionKind::ContextMenu,
            PointerButton::Secondary,
            Modifiers::none(),
        );
        assert_eq!(
            anchor.attribute().as_deref(),
            Some("https://host/watch?v=abc&t=3")
        );
        assert!(page.navigations().is_empty());
    }

    #[test]
    fn click_follows_recycled_element_target() {
        let page = MemoryPage::new("https://host/");
        let anchor = page.add_anchor("https://host/shorts/first");
        let (rewriter, _) = rewriter(&page);
        scan(&rewriter);

        page.host_set_attribute(&anchor, "https://host/shorts/second");
        page.dispatch(
            &anchor,
            InteractionKind::Click,
            PointerButton::Primary,
            Modifiers::none(),
        );
        assert_eq!(
            page.navigations(),
            vec![Navigation::Assign("https://host/watch?v=second".to_owned())]
        );
    }

    #[test]
    fn disposition_follows_modifier_conventions() {
        assert_eq!(
            new_context_disposition(PointerButton::Primary, Modifiers::none()),
            None
        );
        assert_eq!(
            new_context_disposition(PointerButton::Primary, Modifiers::meta()),
            Some(Disposition::BackgroundTab)
        );
        assert_eq!(
            new_context_disposition(PointerButton::Auxiliary, Modifiers::none()),
            Some(Disposition::BackgroundTab)
        );
        assert_eq!(
            new_context_disposition(PointerButton::Primary, Modifiers::shift()),
            Some(Disposition::ForegroundTab)
        );
    }
}
