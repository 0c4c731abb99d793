use rand::Rng;

/// Interface the planners need from a sampled MDP.
pub trait MdpDomain {
    type State: Clone;
    /// `Default` is the action returned when no search information exists.
    type Action: Copy + Default;

    /// Every action in canonical order; each state offers all of them.
    fn actions(&self) -> &[Self::Action];

    /// Sample one `(next_state, reward)` transition.
    fn step<R: Rng + ?Sized>(
        &self,
        state: &Self::State,
        action: Self::Action,
        rng: &mut R,
    ) -> (Self::State, f64);
}

impl MdpDomain for crate::TravelModel {
    type State = crate::MdpState;
    type Action = crate::Action;

    fn actions(&self) -> &[crate::Action] {
        &crate::Action::ALL
    }

    fn step<R: Rng + ?Sized>(
        &self,
        state: &crate::MdpState,
        action: crate::Action,
        rng: &mut R,
    ) -> (crate::MdpState, f64) {
        self.sample(state, action, rng)
    }
}
