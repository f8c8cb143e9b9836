mod retrieval_scenarios;
